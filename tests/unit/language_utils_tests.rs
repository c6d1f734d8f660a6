/*!
 * Tests for language utilities
 */

use textwai::language_utils::{
    get_language_name, language_codes_match, normalize_to_part2t, validate_language_code, LanguageCodeType,
};

/// Test recognition of the three code families
#[test]
fn test_validateLanguageCode_withKnownCodes_shouldReturnType() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code("zh-TW").unwrap(), LanguageCodeType::Part1);
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("english").is_err());
}

/// Test normalization to 639-2/T
#[test]
fn test_normalizeToPart2t_shouldMapAllFamilies() {
    assert_eq!(normalize_to_part2t("vi").unwrap(), "vie");
    assert_eq!(normalize_to_part2t("FR").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("dut").unwrap(), "nld");
    assert_eq!(normalize_to_part2t("pt-BR").unwrap(), "por");
}

/// Test equivalence across code families
#[test]
fn test_languageCodesMatch_shouldCompareNormalizedCodes() {
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("en", "eng"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("zz", "zz"));
}

/// Test display names used in prompts
#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("vi").unwrap(), "Vietnamese");
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert!(get_language_name("zz").is_err());
}
