/*!
 * Tests for protected span extraction and restoration
 */

use textwai::translation::spans::{is_placeholder_word, placeholder, SpanExtractor};
use crate::common;

/// Test that tags are replaced in order of discovery
#[test]
fn test_extract_withInlineTags_shouldReplaceInOrder() {
    let (working, spans) = SpanExtractor::extract("<b>hi</b> there");

    assert_eq!(working, "[CODE_PART_0]hi[CODE_PART_1] there");
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].content, "<b>");
    assert_eq!(spans[0].original_position, 0);
    assert_eq!(spans[0].length, 3);
    assert_eq!(spans[1].content, "</b>");
    assert_eq!(spans[1].original_position, 5);
}

/// Test that a full document survives extract then restore byte-exact
#[test]
fn test_restore_withHtmlDocument_shouldReproduceInput() {
    let (working, spans) = SpanExtractor::extract(common::SAMPLE_HTML);

    assert!(!working.contains('<'));
    assert!(spans.iter().any(|s| s.content.starts_with("<!DOCTYPE")));
    assert!(spans.iter().any(|s| s.content == "<!-- navigation -->"));

    let restoration = SpanExtractor::restore(&working, &spans);
    assert_eq!(restoration.text, common::SAMPLE_HTML);
    assert!(restoration.missing.is_empty());
    assert_eq!(restoration.protected_ranges.len(), spans.len());
}

/// Test that a comment containing tags is protected as one span
#[test]
fn test_extract_withTagsInsideComment_shouldKeepCommentWhole() {
    let (working, spans) = SpanExtractor::extract("a <!-- <b>old</b> --> b");

    assert_eq!(working, "a [CODE_PART_0] b");
    assert_eq!(spans[0].content, "<!-- <b>old</b> -->");
}

/// Test that a tag cut off at the end of the text is protected
#[test]
fn test_extract_withUnterminatedTrailingTag_shouldProtectIt() {
    let (working, spans) = SpanExtractor::extract("Read more <a href=\"/x\"");

    assert_eq!(working, "Read more [CODE_PART_0]");
    assert_eq!(spans[0].content, "<a href=\"/x\"");
}

/// Test that a comparison in prose is not mistaken for a tag
#[test]
fn test_extract_withLessThanInProse_shouldLeaveTextAlone() {
    let (working, spans) = SpanExtractor::extract("if 3 < 5 then");

    assert_eq!(working, "if 3 < 5 then");
    assert!(spans.is_empty());
}

/// Test that placeholder-looking text in the input is itself protected
#[test]
fn test_extract_withLiteralPlaceholder_shouldRoundTrip() {
    let input = "see [CODE_PART_7] and <i>this</i>";
    let (working, spans) = SpanExtractor::extract(input);

    assert_eq!(spans[0].content, "[CODE_PART_7]");
    assert_eq!(SpanExtractor::restore(&working, &spans).text, input);
}

/// Test that missing tokens are reported and the rest still restored
#[test]
fn test_restore_withDroppedToken_shouldReportMissing() {
    let (_, spans) = SpanExtractor::extract("<b>hi</b> there");

    let restoration = SpanExtractor::restore("[CODE_PART_0]salut là", &spans);

    assert_eq!(restoration.text, "<b>salut là");
    assert_eq!(restoration.missing, vec![1]);
    assert_eq!(restoration.protected_ranges, vec![0..3]);
}

/// Test that every copy of a duplicated token is restored
#[test]
fn test_restore_withDuplicatedToken_shouldRestoreAll() {
    let (_, spans) = SpanExtractor::extract("<br>");

    let restoration = SpanExtractor::restore("[CODE_PART_0] x [CODE_PART_0]", &spans);

    assert_eq!(restoration.text, "<br> x <br>");
    assert!(restoration.missing.is_empty());
}

/// Test that token 1 does not match inside token 10
#[test]
fn test_restore_withManySpans_shouldNotConfusePrefixes() {
    let input: String = (0..12).map(|i| format!("<t{}>w", i)).collect();
    let (working, spans) = SpanExtractor::extract(&input);
    assert_eq!(spans.len(), 12);

    // Reverse the token order to simulate a backend reordering them
    let reordered: String = (0..12).rev().map(|i| format!("{}w", placeholder(i))).collect();
    let restoration = SpanExtractor::restore(&reordered, &spans);

    let expected: String = (0..12).rev().map(|i| format!("<t{}>w", i)).collect();
    assert_eq!(restoration.text, expected);
    assert_ne!(working, reordered);
}

/// Test the placeholder word predicate used by the lexicon
#[test]
fn test_isPlaceholderWord_shouldMatchOnlyTokenWords() {
    assert!(is_placeholder_word("CODE_PART_0"));
    assert!(is_placeholder_word("CODE_PART_42"));
    assert!(!is_placeholder_word("CODE_PART_"));
    assert!(!is_placeholder_word("CODE_PART_x"));
    assert!(!is_placeholder_word("code"));
}
