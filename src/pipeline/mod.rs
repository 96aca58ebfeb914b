//! The processing pipeline.
//!
//! Two entry points feed one processor:
//!
//! ```text
//! backlog walk ──┐
//!                ├─→ eligible? ─→ FileProcessor ─→ output tree
//! watch events ──┘                     │
//!                                 Transcriber
//! ```
//!
//! - `paths`: maps a media path to its mirrored transcript path
//! - `processor`: per-file skip/transcribe/write with failure containment
//! - `scanner`: recursive backlog walk at startup
//! - `watcher`: live filesystem events, dispatched sequentially

pub mod paths;
pub mod processor;
pub mod scanner;
pub mod watcher;

// Re-export key types
pub use paths::{transcript_path, MediaTask};
pub use processor::{FileProcessor, ProcessOutcome};
pub use scanner::{DirectoryScanner, ScanReport};
pub use watcher::{MediaArrival, WatchDispatcher, WatchHandle, WatcherError};
