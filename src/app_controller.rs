use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{self, Translator};
use crate::translation::{Cancellation, PipelineOutput, ProgressCallback, RunMetrics, TranslationPipeline};

// @module: Application controller for document translation

/// Main application controller: file in, translated file out
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Backend override, used instead of the configured provider
    translator: Option<Arc<dyn Translator>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        Ok(Self {
            config,
            translator: None,
        })
    }

    /// Use `translator` instead of building one from the configuration
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Default output location for `input_file`
    pub fn output_path_for(&self, input_file: &Path) -> PathBuf {
        FileManager::generate_output_path(input_file, &self.config.target_language)
    }

    /// Translate `input_file` into `output_file` (or the default location)
    ///
    /// Returns `None` when the output already exists and `force_overwrite` is
    /// off. Nothing is written unless the whole run succeeds. File problems
    /// surface as [`AppError::File`], failed runs as [`AppError::Pipeline`].
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<RunMetrics>, AppError> {
        if !FileManager::file_exists(&input_file) {
            return Err(AppError::File(format!("Input file does not exist: {:?}", input_file)));
        }

        let output_path = output_file.unwrap_or_else(|| self.output_path_for(&input_file));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, output already exists: {:?} (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        if language_utils::language_codes_match(&self.config.source_language, &self.config.target_language) {
            warn!("Source and target language are both '{}'", self.config.target_language);
        }

        let text = FileManager::read_to_string(&input_file)
            .map_err(|e| AppError::File(format!("{:#}", e)))?;
        info!("Translating {:?} ({} characters) from {} to {}",
              input_file, text.chars().count(), self.config.source_language, self.config.target_language);

        let output = self.translate_text(&text).await?;

        FileManager::write_to_file(&output_path, &output.text)
            .map_err(|e| AppError::File(format!("Failed to write output file {:?}: {:#}", output_path, e)))?;
        self.write_artifacts(&output)?;

        for line in output.metrics.summary().lines() {
            info!("{}", line);
        }
        info!("Success: {:?}", output_path);

        Ok(Some(output.metrics))
    }

    /// Run the pipeline over `text` with a progress bar and Ctrl-C handling
    pub async fn translate_text(&self, text: &str) -> Result<PipelineOutput, AppError> {
        let translator = match &self.translator {
            Some(translator) => translator.clone(),
            None => providers::from_config(&self.config.translation)?,
        };
        info!("Using {} backend", translator.name());

        let progress_bar = Self::create_progress_bar();
        let bar = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });

        let cancellation = Cancellation::new();
        let interrupt = {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current window");
                    cancellation.cancel();
                }
            })
        };

        let mut pipeline = TranslationPipeline::new(translator, self.config.pipeline_options())?
            .with_cancellation(cancellation)
            .with_progress(progress);
        let result = pipeline.run(text).await;

        interrupt.abort();
        progress_bar.finish_and_clear();

        Ok(result?)
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} windows ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Write the span table and lexicon side files, when configured
    fn write_artifacts(&self, output: &PipelineOutput) -> Result<(), AppError> {
        let artifacts = &self.config.artifacts;

        if let Some(path) = &artifacts.spans_path {
            FileManager::write_json(path, &output.spans)
                .map_err(|e| AppError::File(format!("Failed to write span table {:?}: {:#}", path, e)))?;
            info!("Span table written to {:?}", path);
        }

        match (&artifacts.lexicon_path, &output.lexicon) {
            (Some(path), Some(lexicon)) => {
                FileManager::write_json(path, lexicon)
                    .map_err(|e| AppError::File(format!("Failed to write lexicon {:?}: {:#}", path, e)))?;
                info!("Lexicon written to {:?}", path);
            }
            (Some(_), None) => warn!("Lexicon path set but deduplication is disabled; no lexicon written"),
            _ => {}
        }

        Ok(())
    }
}
