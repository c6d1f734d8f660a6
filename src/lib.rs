/*!
 * # textwai - translate long texts through size-limited services
 *
 * A Rust library for translating arbitrarily long texts with services that
 * only accept bounded requests.
 *
 * ## Features
 *
 * - Markup and code spans are shielded behind `[CODE_PART_n]` placeholders
 *   and restored byte-exact after translation
 * - Paragraph, sentence and word aware chunking with a hard size bound
 * - Bounded-window concurrent translation with pacing and in-order results
 * - Optional duplicate-word lexicon translated once per word
 * - Translation backends:
 *   - Ollama (local LLM)
 *   - OpenAI API and LM Studio
 *   - Google Gemini API
 *   - Google Cloud Translation v2
 *   - Amazon Translate (SigV4-signed)
 *   - An offline mock for dry runs
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The translation core:
 *   - `translation::spans`: Protected span extraction and restoration
 *   - `translation::chunker`: Size-bounded chunking
 *   - `translation::lexicon`: Duplicate-word lexicon
 *   - `translation::scheduler`: Bounded-window batch translation
 *   - `translation::pipeline`: Stage orchestration
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Translation backends behind the `Translator` trait
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use translation::{PipelineOptions, PipelineOutput, RunMetrics, TranslationPipeline};
pub use providers::Translator;
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{AppError, PipelineError, ProviderError};
