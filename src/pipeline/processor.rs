//! Per-file processing.
//!
//! One file in, at most one transcript out. The processor owns the
//! idempotence rule (an existing transcript means done), the atomic write,
//! and the containment of per-file failures: `process` reports an outcome
//! but never propagates an error, so a bad file cannot stop a scan or the
//! watch loop.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::pipeline::paths::MediaTask;
use crate::transcribe::{TranscribeError, Transcriber};

/// Why a file could not be processed
#[derive(Debug, Error)]
enum ProcessError {
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to finalize transcript: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Transcript written
    Transcribed,

    /// Output already present; engine not invoked
    SkippedExisting,

    /// Something went wrong; no output written
    Failed { reason: String },
}

/// Processes one media file at a time.
///
/// Both the backlog scan and the watch dispatcher call into the same
/// instance sequentially, so only one writer ever exists under the output
/// root.
pub struct FileProcessor {
    config: PipelineConfig,
    transcriber: Arc<dyn Transcriber>,
}

impl FileProcessor {
    /// The engine is injected here; the processor never constructs one.
    pub fn new(config: PipelineConfig, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            config,
            transcriber,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a single media file.
    ///
    /// Fire-and-forget from the caller's perspective: every failure is
    /// logged and folded into the returned outcome.
    pub async fn process(&self, input: &Path) -> ProcessOutcome {
        let task = match MediaTask::resolve(
            input,
            &self.config.input_root,
            &self.config.output_root,
        ) {
            Ok(task) => task,
            Err(e) => {
                warn!("Cannot map {}: {}", input.display(), e);
                return ProcessOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if task.output.is_file() {
            debug!("Skipping already processed file: {}", task.input.display());
            return ProcessOutcome::SkippedExisting;
        }

        match self.run(&task).await {
            Ok(()) => {
                info!(
                    "Transcribed {} -> {}",
                    task.input.display(),
                    task.output.display()
                );
                ProcessOutcome::Transcribed
            }
            Err(e) => {
                warn!("Error processing {}: {}", task.input.display(), e);
                ProcessOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The steps that can fail: mkdir, transcribe, write.
    async fn run(&self, task: &MediaTask) -> Result<(), ProcessError> {
        let parent = task.output.parent().unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let transcript = self.transcriber.transcribe(&task.input).await?;

        // Temp file in the destination directory, renamed into place: a
        // transcript is either absent or complete, never partial.
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(transcript.text.as_bytes())?;
        tmp.persist(&task.output)?;

        Ok(())
    }
}
