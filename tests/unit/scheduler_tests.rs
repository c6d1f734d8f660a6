/*!
 * Tests for bounded-window batch scheduling
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use textwai::errors::PipelineError;
use textwai::providers::mock::MockProvider;
use textwai::translation::{BatchScheduler, Cancellation, ProgressCallback, RunMetrics, UnitKind};

fn items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("line {}", i)).collect()
}

/// Test that windows run one after another, never overlapping
#[tokio::test(start_paused = true)]
async fn test_translateAll_withSlowBackend_shouldRunWindowsSequentially() {
    let mock = MockProvider::slow(100);
    let scheduler = BatchScheduler::new(Arc::new(mock.clone()), "en", "de", 3, 0).unwrap();
    let mut metrics = RunMetrics::default();

    let start = Instant::now();
    let results = scheduler.translate_all(&items(7), UnitKind::Chunk, &mut metrics).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(results.len(), 7);
    assert_eq!(mock.max_in_flight(), 3);
    assert_eq!(metrics.window_count, 3);
    assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(400),
            "elapsed {:?}", elapsed);
}

/// Test that failures are counted and do not abort the run
#[tokio::test]
async fn test_translateAll_withIntermittentBackend_shouldCountFailures() {
    let mock = MockProvider::intermittent(3);
    let scheduler = BatchScheduler::new(Arc::new(mock.clone()), "en", "de", 1, 0).unwrap();
    let mut metrics = RunMetrics::default();

    let results = scheduler.translate_all(&items(6), UnitKind::Chunk, &mut metrics).await.unwrap();

    // Requests 3 and 6 fail
    let failed: Vec<usize> = results.iter().filter(|r| r.failed).map(|r| r.sequence_index).collect();
    assert_eq!(failed, vec![2, 5]);
    assert_eq!(results[2].text, "line 2");
    assert_eq!(results[0].text, "[de] line 0");
    assert_eq!(metrics.failed_chunks, 2);
    assert_eq!(metrics.chunk_count, 6);
}

/// Test that cancelling from the progress callback stops after that window
#[tokio::test]
async fn test_translateAll_cancelledAfterFirstWindow_shouldReportProgressMade() {
    let mock = MockProvider::working();
    let cancellation = Cancellation::new();
    let trigger = cancellation.clone();
    let progress: ProgressCallback = Arc::new(move |done, _| {
        if done == 1 {
            trigger.cancel();
        }
    });
    let scheduler = BatchScheduler::new(Arc::new(mock.clone()), "en", "de", 2, 0)
        .unwrap()
        .with_cancellation(cancellation)
        .with_progress(progress);
    let mut metrics = RunMetrics::default();

    let result = scheduler.translate_all(&items(6), UnitKind::Chunk, &mut metrics).await;

    match result {
        Err(PipelineError::Cancelled { completed_windows, total_windows }) => {
            assert_eq!(completed_windows, 1);
            assert_eq!(total_windows, 3);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(mock.request_count(), 2);
}

/// Test the window arithmetic
#[test]
fn test_windowCount_shouldRoundUp() {
    let scheduler = BatchScheduler::new(Arc::new(MockProvider::working()), "en", "de", 4, 0).unwrap();

    assert_eq!(scheduler.window_count(0), 0);
    assert_eq!(scheduler.window_count(4), 1);
    assert_eq!(scheduler.window_count(9), 3);
}
