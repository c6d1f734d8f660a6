/*!
 * Tests for the duplicate-word lexicon
 */

use std::sync::Arc;

use textwai::providers::mock::MockProvider;
use textwai::translation::lexicon::{find_duplicate_words, optimization_stats, Lexicon, LexiconBuilder};
use textwai::translation::{BatchScheduler, RunMetrics};
use crate::common::{self, ScriptedTranslator};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Test the order of duplicates: by second occurrence
#[test]
fn test_findDuplicateWords_shouldOrderBySecondOccurrence() {
    let found = find_duplicate_words("banana apple apple kiwi banana kiwi pear", 4);
    assert_eq!(found, words(&["apple", "banana", "kiwi"]));
}

/// Test that the minimum length is inclusive
#[test]
fn test_findDuplicateWords_withExactMinimum_shouldInclude() {
    assert_eq!(find_duplicate_words("tree tree bee bee", 4), words(&["tree"]));
    assert!(find_duplicate_words("tree tree", 5).is_empty());
}

/// Test word detection on non-ASCII letters
#[test]
fn test_findDuplicateWords_withUnicodeWords_shouldCountThem() {
    let found = find_duplicate_words("café au lait, café noir", 4);
    assert_eq!(found, words(&["café"]));
}

/// Test the reduction figures for marker substitution
#[test]
fn test_optimizationStats_shouldCountSavedCharacters() {
    let text = "alpha beta alpha beta";
    let stats = optimization_stats(text, &words(&["alpha", "beta"]));

    // alpha -> #0 saves 3 twice, beta -> #1 saves 2 twice
    assert_eq!(stats.original_length, 21);
    assert_eq!(stats.characters_reduced(), 10);
    assert!((stats.percentage_reduced() - 47.619).abs() < 0.01);
}

/// Test that the serialized lexicon keeps insertion order
#[test]
fn test_lexicon_serialize_shouldKeepInsertionOrder() {
    let mut lexicon = Lexicon::new();
    lexicon.insert("zebra", "ngựa vằn");
    lexicon.insert("apple", "táo");
    lexicon.insert("zebra", "ngựa");

    let json = serde_json::to_string(&lexicon).unwrap();

    assert_eq!(json, r#"{"zebra":"ngựa","apple":"táo"}"#);
    assert_eq!(lexicon.len(), 2);
}

/// Test that protected ranges are skipped during application
#[test]
fn test_apply_withProtectedRange_shouldLeaveItUntouched() {
    let mut lexicon = Lexicon::new();
    lexicon.insert("class", "lớp");

    let text = "class <p class=\"x\"> class";
    let output = lexicon.apply(text, &[6..19]);

    assert_eq!(output, "lớp <p class=\"x\"> lớp");
}

/// Test that the builder translates each word once and trims answers
#[tokio::test]
async fn test_build_shouldTranslateEachWordOnce() {
    common::init_logging();
    let translator = ScriptedTranslator::new(&[("apple", " táo \n"), ("banana", "chuối")]);
    let scheduler = BatchScheduler::new(Arc::new(translator.clone()), "en", "vi", 4, 0).unwrap();
    let mut metrics = RunMetrics::default();

    let lexicon = LexiconBuilder::new(scheduler, 10, 0)
        .build(&words(&["apple", "banana"]), &mut metrics)
        .await
        .unwrap();

    assert_eq!(lexicon.get("apple"), Some("táo"));
    assert_eq!(lexicon.get("banana"), Some("chuối"));
    assert_eq!(translator.texts().len(), 2);
    assert_eq!(metrics.word_count, 2);
    assert_eq!(metrics.chunk_count, 0);
}

/// Test that a failed word maps to itself
#[tokio::test]
async fn test_build_withFailingWord_shouldMapToItself() {
    let mock = MockProvider::working().failing_on("broken");
    let scheduler = BatchScheduler::new(Arc::new(mock), "en", "fr", 2, 0).unwrap();
    let mut metrics = RunMetrics::default();

    let lexicon = LexiconBuilder::new(scheduler, 1, 0)
        .build(&words(&["broken", "works"]), &mut metrics)
        .await
        .unwrap();

    assert_eq!(lexicon.get("broken"), Some("broken"));
    assert_eq!(lexicon.get("works"), Some("[fr] works"));
    assert_eq!(metrics.failed_words, 1);
    // One window per single-word batch
    assert_eq!(metrics.window_count, 2);
}

/// Test that an empty answer maps the word to itself
#[tokio::test]
async fn test_build_withEmptyAnswer_shouldMapToItself() {
    let translator = ScriptedTranslator::new(&[("ghost", "   ")]);
    let scheduler = BatchScheduler::new(Arc::new(translator), "en", "vi", 1, 0).unwrap();
    let mut metrics = RunMetrics::default();

    let lexicon = LexiconBuilder::new(scheduler, 5, 0)
        .build(&words(&["ghost"]), &mut metrics)
        .await
        .unwrap();

    assert_eq!(lexicon.get("ghost"), Some("ghost"));
}
