//! Live-watch integration tests against the real notify backend.
//!
//! These create and move files under a watched temp directory and assert
//! on the arrivals the dispatcher reports. Waits are generous; the
//! assertions are about ordering and serialization, not latency.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use glob::Pattern;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use mediascribe::{
    FileProcessor, MediaArrival, PipelineConfig, ProcessOutcome, TranscribeError, Transcriber,
    Transcript, WatchDispatcher,
};

/// Engine stand-in that panics on reentrant invocation.
struct SerializingStub {
    in_flight: AtomicBool,
    calls: AtomicUsize,
    delay: Duration,
}

impl SerializingStub {
    fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for SerializingStub {
    async fn transcribe(&self, media: &Path) -> Result<Transcript, TranscribeError> {
        assert!(
            !self.in_flight.swap(true, Ordering::SeqCst),
            "transcriber invoked while a prior call was still in flight"
        );

        tokio::time::sleep(self.delay).await;

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);

        Ok(Transcript {
            text: format!(
                "transcript of {}",
                media.file_name().unwrap_or_default().to_string_lossy()
            ),
            language: "en".to_string(),
            duration_seconds: 1.0,
        })
    }
}

struct Fixture {
    // Keeps the temp tree alive for the duration of the test
    _temp: TempDir,
    root: PathBuf,
    stub: Arc<SerializingStub>,
    processor: Arc<FileProcessor>,
}

impl Fixture {
    fn new(extensions: &[&str], delay: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        // Canonicalized so event paths and the configured root agree even
        // when the temp dir sits behind a symlink
        let root = temp.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("in")).unwrap();
        std::fs::create_dir_all(root.join("out")).unwrap();

        let config = PipelineConfig {
            input_root: root.join("in"),
            output_root: root.join("out"),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            model: "small".to_string(),
            language: None,
            whisper_path: None,
            ignore_patterns: mediascribe::config::DEFAULT_IGNORE
                .iter()
                .map(|p| Pattern::new(p).unwrap())
                .collect(),
            config_file: None,
        };

        let stub = Arc::new(SerializingStub::new(delay));
        let processor = Arc::new(FileProcessor::new(config, stub.clone()));

        Self {
            _temp: temp,
            root,
            stub,
            processor,
        }
    }

    fn input(&self) -> PathBuf {
        self.root.join("in")
    }

    fn output(&self) -> PathBuf {
        self.root.join("out")
    }
}

async fn next_arrival(rx: &mut mpsc::Receiver<MediaArrival>) -> MediaArrival {
    timeout(Duration::from_secs(15), rx.recv())
        .await
        .expect("timed out waiting for an arrival")
        .expect("arrival channel closed")
}

/// Let the backend arm its watches before files start appearing.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn rapid_creates_are_processed_sequentially_and_completely() {
    let fx = Fixture::new(&["wav"], Duration::from_millis(50));
    let (mut rx, handle) = WatchDispatcher::new(Arc::clone(&fx.processor)).spawn();
    settle().await;

    for i in 0..5 {
        std::fs::write(fx.input().join(format!("clip{}.wav", i)), b"pcm").unwrap();
    }

    for _ in 0..5 {
        let arrival = next_arrival(&mut rx).await;
        assert_eq!(arrival.outcome, ProcessOutcome::Transcribed);
    }

    handle.stop().await.unwrap();

    // Exactly five engine calls, none reentrant (the stub asserts that),
    // and every transcript is in place
    assert_eq!(fx.stub.calls(), 5);
    for i in 0..5 {
        assert!(fx.output().join(format!("clip{}.txt", i)).is_file());
    }
}

#[tokio::test]
async fn file_moved_into_the_tree_is_processed() {
    let fx = Fixture::new(&["mp3"], Duration::from_millis(10));

    // Staged outside the watched root, then renamed in
    let staging = fx.root.join("staging");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("moved.mp3"), b"media").unwrap();

    let (mut rx, handle) = WatchDispatcher::new(Arc::clone(&fx.processor)).spawn();
    settle().await;

    std::fs::rename(staging.join("moved.mp3"), fx.input().join("moved.mp3")).unwrap();

    let arrival = next_arrival(&mut rx).await;
    assert_eq!(arrival.outcome, ProcessOutcome::Transcribed);
    assert_eq!(arrival.path, fx.input().join("moved.mp3"));

    handle.stop().await.unwrap();

    assert!(fx.output().join("moved.txt").is_file());
}

#[tokio::test]
async fn unsupported_and_ignored_files_never_reach_the_engine() {
    let fx = Fixture::new(&["mp3"], Duration::from_millis(10));
    let (mut rx, handle) = WatchDispatcher::new(Arc::clone(&fx.processor)).spawn();
    settle().await;

    std::fs::write(fx.input().join("notes.pdf"), b"pdf").unwrap();
    std::fs::write(fx.input().join(".hidden.mp3"), b"media").unwrap();
    std::fs::write(fx.input().join("song.mp3"), b"media").unwrap();

    // Only the eligible file produces an arrival
    let arrival = next_arrival(&mut rx).await;
    assert_eq!(arrival.path, fx.input().join("song.mp3"));
    assert_eq!(arrival.outcome, ProcessOutcome::Transcribed);

    // A quiet grace period: nothing else shows up
    assert!(
        timeout(Duration::from_millis(800), rx.recv()).await.is_err(),
        "unexpected extra arrival"
    );

    handle.stop().await.unwrap();

    assert_eq!(fx.stub.calls(), 1);
    assert!(!fx.output().join("notes.txt").exists());
    assert!(!fx.output().join(".hidden.txt").exists());
}

#[tokio::test]
async fn arrival_with_existing_transcript_is_skipped() {
    let fx = Fixture::new(&["mp3"], Duration::from_millis(10));
    std::fs::write(fx.output().join("known.txt"), b"already transcribed").unwrap();

    let (mut rx, handle) = WatchDispatcher::new(Arc::clone(&fx.processor)).spawn();
    settle().await;

    std::fs::write(fx.input().join("known.mp3"), b"media").unwrap();

    let arrival = next_arrival(&mut rx).await;
    assert_eq!(arrival.outcome, ProcessOutcome::SkippedExisting);

    handle.stop().await.unwrap();

    assert_eq!(fx.stub.calls(), 0);
    let kept = std::fs::read_to_string(fx.output().join("known.txt")).unwrap();
    assert_eq!(kept, "already transcribed");
}

#[tokio::test]
async fn stop_shuts_the_loop_down() {
    let fx = Fixture::new(&["mp3"], Duration::from_millis(10));
    let (mut rx, handle) = WatchDispatcher::new(Arc::clone(&fx.processor)).spawn();
    settle().await;

    handle.stop().await.unwrap();

    // The arrival channel closes once the loop is gone
    assert!(
        timeout(Duration::from_secs(5), rx.recv()).await.unwrap().is_none(),
        "channel should be closed after stop"
    );
}
