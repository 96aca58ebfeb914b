//! Command-line interface for mediascribe.
//!
//! - `mediascribe run` - process the backlog, then watch until Ctrl+C
//! - `mediascribe scan` - process the backlog once and exit
//! - `mediascribe config` - show the resolved configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{Overrides, PipelineConfig};
use crate::pipeline::{DirectoryScanner, FileProcessor, ProcessOutcome, ScanReport, WatchDispatcher};
use crate::transcribe::{Transcriber, WhisperTranscriber};

/// mediascribe - directory-watching transcription pipeline
#[derive(Parser, Debug)]
#[command(name = "mediascribe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options every subcommand accepts
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Directory to watch for media files
    #[arg(short, long, env = "MEDIASCRIBE_INPUT_DIR")]
    input: Option<PathBuf>,

    /// Directory receiving transcripts (mirrors the input tree)
    #[arg(short, long, env = "MEDIASCRIBE_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Whisper model (tiny, base, small, medium, large)
    #[arg(short, long, env = "MEDIASCRIBE_MODEL")]
    model: Option<String>,

    /// Extensions to process (comma-separated, e.g. "mp3,wav,mp4")
    #[arg(short, long, env = "MEDIASCRIBE_EXTENSIONS")]
    extensions: Option<String>,

    /// Spoken-language hint passed to the engine
    #[arg(long, env = "MEDIASCRIBE_LANGUAGE")]
    language: Option<String>,

    /// Whisper binary (otherwise WHISPER_PATH or the default location)
    #[arg(long)]
    whisper_path: Option<PathBuf>,
}

impl ConfigArgs {
    fn into_overrides(self) -> Overrides {
        Overrides {
            input: self.input,
            output: self.output,
            model: self.model,
            language: self.language,
            whisper_path: self.whisper_path,
            extensions: self.extensions.map(|s| {
                s.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            }),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process existing files, then watch for new ones until interrupted
    Run {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Process existing files once and exit
    Scan {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Show the resolved configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run { config } => execute_run(config.into_overrides()).await,
            Commands::Scan { config } => execute_scan(config.into_overrides()).await,
            Commands::Config { config } => execute_config(config.into_overrides()).await,
        }
    }
}

/// Resolve configuration and build the processor with its engine.
///
/// Everything that must be in place before any file is touched happens
/// here: input root check, output root creation, engine probe. Any failure
/// is fatal.
fn build_processor(overrides: Overrides) -> Result<FileProcessor> {
    let config = PipelineConfig::resolve(overrides)?;
    config.validate()?;

    std::fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "failed to create output directory {}",
            config.output_root.display()
        )
    })?;

    let transcriber: Arc<dyn Transcriber> = Arc::new(
        WhisperTranscriber::new(&config).context("transcription engine unavailable")?,
    );

    Ok(FileProcessor::new(config, transcriber))
}

fn print_report(report: &ScanReport) {
    println!();
    println!("Scan results:");
    println!("  Transcribed:   {}", report.transcribed);
    println!("  Already done:  {}", report.skipped_existing);
    println!("  Failed:        {}", report.failed);
    println!("  Filtered out:  {}", report.filtered);
    println!("  Total files:   {}", report.total());
}

/// Process the backlog once
async fn execute_scan(overrides: Overrides) -> Result<()> {
    let processor = build_processor(overrides)?;

    println!("📂 Scanning: {}", processor.config().input_root.display());

    let report = DirectoryScanner::new(&processor).scan().await;
    print_report(&report);

    Ok(())
}

/// Backlog first, then live watching until Ctrl+C
async fn execute_run(overrides: Overrides) -> Result<()> {
    let processor = Arc::new(build_processor(overrides)?);

    println!(
        "📂 Processing existing files in {}",
        processor.config().input_root.display()
    );
    let report = DirectoryScanner::new(&processor).scan().await;
    print_report(&report);

    println!();
    println!("👁️  Watching: {}", processor.config().input_root.display());
    println!("    Press Ctrl+C to stop");
    println!();

    let (mut arrival_rx, handle) = WatchDispatcher::new(Arc::clone(&processor)).spawn();

    // Ctrl+C handler
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        let _ = stop_tx.send(());
    });

    loop {
        tokio::select! {
            Some(arrival) = arrival_rx.recv() => {
                match arrival.outcome {
                    ProcessOutcome::Transcribed => {
                        println!("✅ {}", arrival.path.display());
                    }
                    ProcessOutcome::SkippedExisting => {
                        println!("⏭️  {} (already done)", arrival.path.display());
                    }
                    ProcessOutcome::Failed { reason } => {
                        println!("❌ {}: {}", arrival.path.display(), reason);
                    }
                }
            }
            _ = &mut stop_rx => {
                println!();
                println!("🛑 Stopping watcher...");
                handle.stop().await?;
                break;
            }
        }
    }

    Ok(())
}

/// Show the resolved configuration
async fn execute_config(overrides: Overrides) -> Result<()> {
    let config = PipelineConfig::resolve(overrides)?;

    println!();
    println!("mediascribe configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file:  {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Input root:   {}", config.input_root.display());
    println!("Output root:  {}", config.output_root.display());
    println!("Model:        {}", config.model);
    println!(
        "Language:     {}",
        config.language.as_deref().unwrap_or("(auto)")
    );
    println!("Extensions:   {}", config.extensions.join(", "));
    println!();

    if config.input_root.is_dir() {
        println!("✓ Input root exists");
    } else {
        println!("⚠️  Input root does not exist");
    }

    Ok(())
}
