//! Whisper engine adapter.
//!
//! Shells out to a local whisper binary and parses its JSON output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{TranscribeError, Transcriber, Transcript};
use crate::config::PipelineConfig;

/// Binary location when neither the config nor WHISPER_PATH say otherwise.
const DEFAULT_BINARY: &str = "/opt/homebrew/bin/whisper";

/// Whisper output JSON structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    end: f64,
}

/// Subprocess-backed whisper engine.
///
/// The model identifier is bound at construction and reused for every
/// call; nothing about the engine changes after startup.
pub struct WhisperTranscriber {
    binary: PathBuf,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Bind an engine to the configured model.
    ///
    /// Probes for the binary up front so a missing engine fails at startup
    /// rather than on the first file.
    pub fn new(config: &PipelineConfig) -> Result<Self, TranscribeError> {
        let binary = config
            .whisper_path
            .clone()
            .or_else(|| std::env::var_os("WHISPER_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));

        if !binary.is_file() {
            return Err(TranscribeError::BinaryNotFound(binary));
        }

        Ok(Self {
            binary,
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, media: &Path) -> Result<Transcript, TranscribeError> {
        // Whisper writes one file per requested format into --output_dir
        let out_dir = tempfile::tempdir()?;

        let mut command = Command::new(&self.binary);
        command
            .arg(media)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_dir")
            .arg(out_dir.path())
            .arg("--output_format")
            .arg("json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(language) = &self.language {
            command.arg("--language").arg(language);
        }

        let output = command.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::Engine(stderr.trim().to_string()));
        }

        let stem = media.file_stem().unwrap_or_default().to_string_lossy();
        let json_path = out_dir.path().join(format!("{}.json", stem));
        let json = tokio::fs::read_to_string(&json_path).await?;

        let parsed: WhisperOutput = serde_json::from_str(&json)?;
        let duration = parsed.segments.last().map(|s| s.end).unwrap_or(0.0);

        Ok(Transcript {
            text: parsed.text.trim().to_string(),
            language: parsed.language,
            duration_seconds: duration,
        })
    }
}
