use anyhow::{Result, anyhow};
use log::{error, warn, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::app_config::Config;
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::subtitle_processor::SubtitleDocument;
use crate::translation::observer::{events, LogObserver, TranslationObserver};
use crate::translation::{OrchestratorSettings, RetryOrchestrator, TranslationBackend, TranslationService};

// @module: Application controller for subtitle processing

/// What happened to a single input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Translated and written; `untranslated` lines kept their original text
    Translated {
        output: PathBuf,
        lines: usize,
        untranslated: usize,
        rounds: usize,
    },
    /// Translation disabled, file copied unchanged
    Copied { output: PathBuf },
    /// Nothing written
    Skipped { reason: String },
}

/// Counts of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Observer that drives a chunk progress bar and forwards events to the log
struct ProgressObserver {
    bar: ProgressBar,
    inner: LogObserver,
}

impl TranslationObserver for ProgressObserver {
    fn record(&self, event: &str, fields: &[(&str, String)]) {
        let field = |key: &str| fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        match event {
            events::PHASE_STARTED => {
                let chunks = field("chunks").and_then(|v| v.parse().ok()).unwrap_or(0);
                self.bar.set_length(chunks);
                self.bar.set_position(0);
                match (field("phase"), field("round")) {
                    (Some("retry"), Some(round)) => self.bar.set_message(format!("Retry round {}", round)),
                    _ => self.bar.set_message("Translating"),
                }
            }
            events::CHUNK_RECONCILED => self.bar.inc(1),
            _ => {}
        }

        // Keep log lines from tearing the bar
        self.bar.suspend(|| self.inner.record(event, fields));
    }
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Backend used for translation, absent when translation is disabled
    backend: Option<Arc<dyn TranslationBackend>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backend: Option<Arc<dyn TranslationBackend>> = if config.translation_enabled() {
            let service = TranslationService::new(config.translation.clone(), &config.target_language)?;
            Some(Arc::new(service))
        } else {
            None
        };

        Ok(Self { config, backend })
    }

    // @method: Create a controller around an existing backend
    pub fn with_backend(config: Config, backend: Arc<dyn TranslationBackend>) -> Self {
        Self {
            config,
            backend: Some(backend),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process a single subtitle file into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let multi_progress = MultiProgress::new();
        let output_path = FileManager::output_path(&input_file, &output_dir)?;
        self.run_with_progress(&input_file, &output_path, &multi_progress, force_overwrite).await
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_path: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_path.to_path_buf();
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, output already exists (use -f to force overwrite)", output_path.display());
            return Ok(FileOutcome::Skipped {
                reason: format!("output exists: {}", output_path.display()),
            });
        }

        let document = SubtitleDocument::from_file(input_file)?;
        if document.is_empty() {
            let reason = SubtitleError::EmptyDocument(input_file.display().to_string());
            warn!("{}", reason);
            return Ok(FileOutcome::Skipped { reason: reason.to_string() });
        }

        let backend = match (&self.backend, self.config.translation_enabled()) {
            (Some(backend), true) => backend,
            _ => {
                FileManager::copy_file(input_file, &output_path)?;
                info!("Translation disabled, copied: {}", output_path.display());
                return Ok(FileOutcome::Copied { output: output_path });
            }
        };

        info!(
            "Translating {} ({} lines, {}) with {} - {}",
            input_file.display(),
            document.len(),
            document.format(),
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let observer = ProgressObserver {
            bar: progress_bar.clone(),
            inner: LogObserver,
        };
        let settings = OrchestratorSettings::from(&self.config.translation.common);
        let lines = document.texts();
        let outcome = RetryOrchestrator::new(backend.as_ref(), &observer, settings)
            .run(&lines)
            .await;
        progress_bar.finish_and_clear();

        if let Some(exhaustion) = outcome.exhaustion() {
            warn!("{}: {}", input_file.display(), exhaustion);
        }
        info!("Finally untranslated lines: {}", outcome.untranslated.len());

        let rendered = document.render(&outcome.texts)?;
        FileManager::write_to_file(&output_path, &rendered)?;
        info!(
            "Saved: {} in {}",
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );

        Ok(FileOutcome::Translated {
            output: output_path,
            lines: lines.len(),
            untranslated: outcome.untranslated.len(),
            rounds: outcome.rounds,
        })
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }

    /// Run the workflow in folder mode, processing every subtitle file in a directory.
    ///
    /// Outputs mirror each file's location below `input_dir`, and `output_dir` itself is never
    /// scanned. A failure on one file is logged and counted; the remaining files are still processed.
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
        recursive: bool,
    ) -> Result<FolderSummary> {
        let start_time = Instant::now();

        let subtitle_files = FileManager::find_subtitle_files_excluding(&input_dir, recursive, Some(&output_dir))?;
        if subtitle_files.is_empty() {
            warn!("No .srt or .ass files found in {}", input_dir.display());
            return Ok(FolderSummary::default());
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for subtitle_file in &subtitle_files {
            let file_name = subtitle_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let outcome = match FileManager::mirrored_output_path(subtitle_file, &input_dir, &output_dir) {
                Ok(output_path) => self.run_with_progress(subtitle_file, &output_path, &multi_progress, force_overwrite).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(FileOutcome::Skipped { .. }) => summary.skipped += 1,
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    folder_pb.suspend(|| error!("Error processing file {}: {:#}", file_name, e));
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }
}
