//! Transcription engine seam.
//!
//! The pipeline needs exactly one capability from an engine: turn a media
//! file into text. Engines are injected into the processor as trait objects,
//! and failure comes back as a value rather than an unwind, so one bad file
//! never takes down a scan or the watch loop.

pub mod whisper;

pub use whisper::WhisperTranscriber;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors an engine can surface for a single file
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("engine binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("failed to run engine: {0}")]
    Io(#[from] std::io::Error),

    #[error("transcription failed: {0}")]
    Engine(String),

    #[error("unreadable engine output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result of transcribing one media file
#[derive(Debug, Clone)]
pub struct Transcript {
    /// The transcribed text; the only part the pipeline persists
    pub text: String,

    /// Language the engine detected (or was told)
    pub language: String,

    /// Media duration as reported by the engine
    pub duration_seconds: f64,
}

/// A speech-to-text engine.
///
/// Implementations own their model handle. A call may take seconds to
/// minutes and blocks its caller; the pipeline never runs two calls
/// concurrently.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, media: &Path) -> Result<Transcript, TranscribeError>;
}
