//! Live directory watch.
//!
//! Subscribes to filesystem notifications for the input root and feeds
//! newly created or moved-in files through the processor, one at a time.
//! The notify backend's thread only enqueues events into a channel; this
//! loop drains it sequentially, so processing never overlaps and events
//! arriving during a long transcription wait their turn instead of being
//! dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::pipeline::processor::{FileProcessor, ProcessOutcome};

/// Errors that can occur while setting up or running the watch
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("event channel disconnected")]
    Disconnected,
}

/// A processed arrival, surfaced for progress reporting
#[derive(Debug, Clone)]
pub struct MediaArrival {
    /// Path the filesystem reported
    pub path: PathBuf,

    /// What the processor did with it
    pub outcome: ProcessOutcome,

    /// When the event was picked up
    pub detected_at: DateTime<Utc>,
}

/// Dispatches filesystem events into the processor.
pub struct WatchDispatcher {
    processor: Arc<FileProcessor>,
}

impl WatchDispatcher {
    pub fn new(processor: Arc<FileProcessor>) -> Self {
        Self { processor }
    }

    /// Start watching. Runs until `WatchHandle::stop` is called.
    ///
    /// Each arrival is reported on the returned channel after its file has
    /// been fully processed.
    pub fn spawn(self) -> (mpsc::Receiver<MediaArrival>, WatchHandle) {
        let (arrival_tx, arrival_rx) = mpsc::channel::<MediaArrival>(100);
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            if let Err(e) = run_dispatch(self.processor, arrival_tx, stop_rx).await {
                tracing::error!("Watch loop failed: {}", e);
            }
        });

        (arrival_rx, WatchHandle { stop_tx, task })
    }
}

/// Handle to stop the dispatcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Signal the loop to stop and wait for it to wind down.
    ///
    /// An in-flight transcription is awaited, never cancelled.
    pub async fn stop(self) -> Result<(), tokio::task::JoinError> {
        let _ = self.stop_tx.send(()).await;
        self.task.await
    }
}

/// The dispatch loop: sole consumer of the notify channel.
async fn run_dispatch(
    processor: Arc<FileProcessor>,
    arrival_tx: mpsc::Sender<MediaArrival>,
    mut stop_rx: mpsc::Receiver<()>,
) -> Result<(), WatcherError> {
    let input_root = processor.config().input_root.clone();

    // The backend thread pushes into this channel; everything after it is
    // strictly sequential.
    let (tx, rx) = std::sync::mpsc::channel();

    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
    watcher.watch(&input_root, RecursiveMode::Recursive)?;

    info!("Watching {} for new media", input_root.display());

    loop {
        // Check for stop signal between events
        if stop_rx.try_recv().is_ok() {
            info!("Watcher stopping");
            break;
        }

        // Drain whatever queued while we were processing or idle
        loop {
            match rx.try_recv() {
                Ok(Ok(event)) => {
                    for path in arrival_paths(&event) {
                        // Directory events and ineligible files never
                        // reach the processor.
                        if !path.is_file() || !processor.config().eligible(&path) {
                            debug!("Ignoring {}", path.display());
                            continue;
                        }

                        let detected_at = Utc::now();
                        let outcome = processor.process(&path).await;
                        let _ = arrival_tx
                            .send(MediaArrival {
                                path,
                                outcome,
                                detected_at,
                            })
                            .await;
                    }
                }
                Ok(Err(e)) => {
                    warn!("Watch backend error: {:?}", e);
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    return Err(WatcherError::Disconnected);
                }
            }
        }

        // Idle wait between events; this is the cancellation point
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

/// Paths a notification contributes to the pipeline: file creations and the
/// destination side of moves into the tree. Every other event kind is noise
/// to this pipeline and is dropped.
fn arrival_paths(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.clone(),
        // Some backends report renames without a direction; the is_file
        // check downstream discards the vacated source side.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => event.paths.clone(),
        // Both sides of an intra-tree rename arrive in one event; the
        // destination is the last path.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().cloned().into_iter().collect()
        }
        _ => Vec::new(),
    }
}
