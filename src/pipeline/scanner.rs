//! Backlog scan.
//!
//! One-shot recursive walk of the input root, run at startup before live
//! watching begins. Files are handed to the processor strictly one at a
//! time, in the order the walk yields them; every invocation is a fresh
//! walk, so a restarted process simply rescans and skips what is done.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::pipeline::processor::{FileProcessor, ProcessOutcome};

/// Counters for one backlog scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Transcripts written this scan
    pub transcribed: usize,

    /// Files whose transcript already existed
    pub skipped_existing: usize,

    /// Files the processor gave up on
    pub failed: usize,

    /// Files the admission policy excluded (extension or ignore pattern)
    pub filtered: usize,
}

impl ScanReport {
    /// Every regular file the walk visited
    pub fn total(&self) -> usize {
        self.transcribed + self.skipped_existing + self.failed + self.filtered
    }
}

/// Walks the input tree and processes every eligible file.
pub struct DirectoryScanner<'a> {
    processor: &'a FileProcessor,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(processor: &'a FileProcessor) -> Self {
        Self { processor }
    }

    /// Scan the whole input root.
    pub async fn scan(&self) -> ScanReport {
        let root = self.processor.config().input_root.clone();
        info!("Scanning {}", root.display());

        let mut report = ScanReport::default();

        for entry in WalkDir::new(&root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error under {}: {}", root.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                debug!("Entering {}", entry.path().display());
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            self.visit(entry.path(), &mut report).await;
        }

        info!(
            "Scan complete: {} transcribed, {} already done, {} failed, {} filtered",
            report.transcribed, report.skipped_existing, report.failed, report.filtered
        );

        report
    }

    async fn visit(&self, path: &Path, report: &mut ScanReport) {
        if !self.processor.config().eligible(path) {
            debug!("Filtered {}", path.display());
            report.filtered += 1;
            return;
        }

        match self.processor.process(path).await {
            ProcessOutcome::Transcribed => report.transcribed += 1,
            ProcessOutcome::SkippedExisting => report.skipped_existing += 1,
            ProcessOutcome::Failed { .. } => report.failed += 1,
        }
    }
}
