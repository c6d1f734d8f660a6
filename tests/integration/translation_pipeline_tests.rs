/*!
 * End-to-end pipeline tests against offline backends
 */

use std::sync::Arc;

use textwai::errors::PipelineError;
use textwai::providers::mock::MockProvider;
use textwai::translation::{
    Cancellation, PipelineOptions, PipelineStage, SpanExtractor, TranslationPipeline,
};
use crate::common::{self, ScriptedTranslator};

fn options(max_chunk_size: usize, concurrency: usize) -> PipelineOptions {
    PipelineOptions {
        max_chunk_size,
        concurrency,
        inter_batch_delay_ms: 0,
        lexicon_delay_ms: 0,
        ..Default::default()
    }
}

fn identity(text: &str, _: &str, _: &str) -> String {
    text.to_string()
}

/// Test that out-of-order completions still produce an in-order document
#[tokio::test(start_paused = true)]
async fn test_run_withRandomLatency_shouldKeepDocumentOrder() {
    common::init_logging();
    let input = common::sample_prose(30);
    let mock = MockProvider::random_latency(1, 50).with_custom_response(identity);
    let mut pipeline = TranslationPipeline::new(Arc::new(mock.clone()), options(100, 8)).unwrap();

    let output = pipeline.run(&input).await.unwrap();

    assert_eq!(output.text, input);
    assert_eq!(output.metrics.chunk_count, mock.request_count());
    assert!(mock.max_in_flight() <= 8);
    assert_eq!(output.metrics.window_count, output.metrics.chunk_count.div_ceil(8));
}

/// Test that markup comes back byte-exact while prose is translated
#[tokio::test]
async fn test_run_withHtmlDocument_shouldPreserveMarkupExactly() {
    let translator = ScriptedTranslator::new(&[]);
    let mut pipeline = TranslationPipeline::new(Arc::new(translator.clone()), options(60, 4)).unwrap();

    let output = pipeline.run(common::SAMPLE_HTML).await.unwrap();

    let (working, spans) = SpanExtractor::extract(common::SAMPLE_HTML);
    let expected = SpanExtractor::restore(&common::uppercase_outside_placeholders(&working), &spans);
    assert_eq!(output.text, expected.text);
    assert!(output.text.starts_with("<!DOCTYPE html>\n<html>"));
    assert!(output.text.contains("<a href=\"https://example.com\">A LINK</a>"));
    assert!(output.text.ends_with("</html>\n"));
    assert_eq!(output.metrics.missing_placeholders, 0);

    // The backend never saw markup
    for text in translator.texts() {
        assert!(!text.contains('<'), "markup leaked: {:?}", text);
    }
}

/// Test that the languages are forwarded to the backend
#[tokio::test]
async fn test_run_shouldForwardLanguagePair() {
    let translator = ScriptedTranslator::new(&[]);
    let opts = PipelineOptions {
        source_language: "de".to_string(),
        target_language: "ja".to_string(),
        ..options(100, 2)
    };
    let mut pipeline = TranslationPipeline::new(Arc::new(translator.clone()), opts).unwrap();

    pipeline.run("Guten Tag.").await.unwrap();

    let calls = translator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], ("Guten Tag.".to_string(), "de".to_string(), "ja".to_string()));
}

/// Test that a failing chunk keeps its source text and the run completes
#[tokio::test]
async fn test_run_withOneFailingChunk_shouldFallBackToSource() {
    let input = "First part here.\n\nSecond part here.\n\nThird part here.";
    let mock = MockProvider::working().failing_on("Second");
    let mut pipeline = TranslationPipeline::new(Arc::new(mock), options(20, 3)).unwrap();

    let output = pipeline.run(input).await.unwrap();

    assert_eq!(output.text, "[vi] First part here.\n\nSecond part here.\n\n[vi] Third part here.");
    assert_eq!(output.metrics.chunk_count, 3);
    assert_eq!(output.metrics.failed_chunks, 1);
}

/// Test that a dropped placeholder is reported, not fatal
#[tokio::test]
async fn test_run_withBackendDroppingTokens_shouldReportMissing() {
    fn drop_tokens(text: &str, _: &str, _: &str) -> String {
        text.replace("[CODE_PART_1]", "")
    }
    let mock = MockProvider::working().with_custom_response(drop_tokens);
    let mut pipeline = TranslationPipeline::new(Arc::new(mock), options(100, 1)).unwrap();

    let output = pipeline.run("<b>bold</b> text").await.unwrap();

    assert_eq!(output.text, "<b>bold text");
    assert_eq!(output.metrics.missing_placeholders, 1);
    assert_eq!(pipeline.stage(), PipelineStage::Done);
}

/// Test that lexicon substitution spares attribute values inside markup
#[tokio::test]
async fn test_run_withDeduplication_shouldNotTouchRestoredMarkup() {
    fn backend(text: &str, _: &str, _: &str) -> String {
        match text {
            "garden" => "vườn".to_string(),
            other => other.to_string(),
        }
    }
    let mock = MockProvider::working().with_custom_response(backend);
    let opts = PipelineOptions { enable_deduplication: true, ..options(100, 2) };
    let mut pipeline = TranslationPipeline::new(Arc::new(mock.clone()), opts).unwrap();

    let output = pipeline.run("<p class=\"garden\">garden</p> garden").await.unwrap();

    assert_eq!(output.text, "<p class=\"garden\">vườn</p> vườn");
    let lexicon = output.lexicon.expect("lexicon should be built");
    assert_eq!(lexicon.get("garden"), Some("vườn"));
    assert_eq!(output.metrics.word_count, 1);
    // One word call, one chunk call
    assert_eq!(mock.request_count(), 2);
}

/// Test that a cancelled run fails before any chunk is sent
#[tokio::test]
async fn test_run_whenCancelled_shouldStopBeforeTranslating() {
    let mock = MockProvider::working();
    let cancellation = Cancellation::new();
    cancellation.cancel();
    let mut pipeline = TranslationPipeline::new(Arc::new(mock.clone()), options(20, 1))
        .unwrap()
        .with_cancellation(cancellation);

    let result = pipeline.run("First part here.\n\nSecond part here.").await;

    match result {
        Err(PipelineError::Cancelled { completed_windows, total_windows }) => {
            assert_eq!(completed_windows, 0);
            assert_eq!(total_windows, 2);
        }
        other => panic!("expected cancellation, got {:?}", other.map(|o| o.text)),
    }
    assert_eq!(mock.request_count(), 0);
    assert_eq!(pipeline.stage(), PipelineStage::Chunked);
}

/// Test that a pipeline can be reused for several documents
#[tokio::test]
async fn test_run_calledTwice_shouldResetStateBetweenRuns() {
    let mock = MockProvider::working();
    let mut pipeline = TranslationPipeline::new(Arc::new(mock), options(100, 2)).unwrap();

    let first = pipeline.run("<i>one</i>").await.unwrap();
    let second = pipeline.run("two").await.unwrap();

    assert_eq!(first.text, "[vi] <i>one</i>");
    assert_eq!(second.text, "[vi] two");
    assert!(second.spans.is_empty());
    assert_eq!(second.metrics.chunk_count, 1);
}
