//! mediascribe - directory-watching transcription pipeline
//!
//! Watches a directory tree for media files and mirrors it into a tree of
//! transcript text files. An existing transcript is the only marker of
//! completed work, which makes the pipeline restart-safe without a queue
//! or ledger: rescan, skip what exists, continue.
//!
//! # Architecture
//!
//! ```text
//! backlog scan ──┐
//!                ├─→ FileProcessor ─→ Transcriber ─→ output tree
//! watch events ──┘   (one file at a time)
//! ```
//!
//! All processing is strictly sequential: the startup scan and every
//! watch-triggered file go through one processor, one file at a time.
//! Per-file failures are logged and skipped; they never stop the run.
//!
//! # Modules
//!
//! - `config`: startup configuration (flags, env, config file)
//! - `pipeline`: path mapping, per-file processing, backlog scan, live watch
//! - `transcribe`: engine seam and the whisper adapter
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Backlog, then watch until Ctrl+C
//! mediascribe run --input ~/media --output ~/transcripts
//!
//! # Backlog only
//! mediascribe scan --input ~/media --output ~/transcripts --model base
//! ```

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod transcribe;

// Re-export main types at crate root for convenience
pub use config::{ConfigError, Overrides, PipelineConfig};
pub use pipeline::{
    DirectoryScanner, FileProcessor, MediaArrival, MediaTask, ProcessOutcome, ScanReport,
    WatchDispatcher, WatchHandle,
};
pub use transcribe::{TranscribeError, Transcriber, Transcript, WhisperTranscriber};
