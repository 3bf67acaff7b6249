//! Batch processing command for multiple invoice images.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use invx_core::export::export_file_name;
use invx_core::{BatchEvent, BatchOrchestrator, FileBlob, FsStorage, VisionExtractor};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file (default: invoices-<timestamp>.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for the extracted records
    #[arg(short, long, value_enum, default_value = "csv")]
    format: BatchFormat,

    /// Number of files processed at once
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Directory for stored copies of the images
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Return canned results instead of calling the model
    #[arg(long)]
    mock: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum BatchFormat {
    /// CSV export (Date, ABN, Amount, GST, Description, Category)
    Csv,
    /// JSON array of records
    Json,
}

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.mock {
        config.vision.mock = true;
    }
    if let Some(jobs) = args.jobs {
        config.batch.concurrency = jobs;
    }
    if let Some(upload_dir) = &args.upload_dir {
        config.storage.upload_dir = upload_dir.clone();
    }

    // Expand glob pattern
    let paths: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();

    if paths.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        paths.len()
    );

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();
        files.push(FileBlob::new(name, fs::read(path)?));
    }

    let storage = FsStorage::new(&config.storage.upload_dir, &config.storage.public_path);
    let extractor = VisionExtractor::from_config(&config.vision, &config.extraction)?;
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = BatchOrchestrator::new(Arc::new(storage), Arc::new(extractor))
        .with_concurrency(config.batch.concurrency)
        .with_events(tx);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let (summary, ()) = tokio::join!(orchestrator.submit(files), track_progress(rx, &pb));
    pb.finish_with_message("Complete");

    let output_path = args.output.clone().unwrap_or_else(|| {
        let name = export_file_name(Utc::now());
        match args.format {
            BatchFormat::Csv => PathBuf::from(name),
            BatchFormat::Json => PathBuf::from(name).with_extension("json"),
        }
    });

    let content = match args.format {
        BatchFormat::Csv => orchestrator.export_csv()?,
        BatchFormat::Json => serde_json::to_string_pretty(&orchestrator.records())?,
    };
    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        summary.submitted,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(summary.succeeded).green(),
        style(summary.failed()).red()
    );
    println!(
        "{} Records written to {}",
        style("✓").green(),
        output_path.display()
    );

    if !summary.failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (name, error) in &summary.failures {
            println!("  - {}: {}", name, error);
        }
    }

    Ok(())
}

/// Advance the bar as items finish; returns when the batch does.
async fn track_progress(mut rx: mpsc::UnboundedReceiver<BatchEvent>, pb: &ProgressBar) {
    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::StateChanged { name, state, .. } if state.is_terminal() => {
                if let Some(error) = state.error() {
                    warn!("Failed to process {}: {}", name, error);
                }
                pb.set_message(name);
                pb.inc(1);
            }
            BatchEvent::StateChanged { name, state, .. } => {
                pb.set_message(format!("{} ({})", name, state.label()));
            }
            BatchEvent::Finished(_) => break,
            BatchEvent::Queued(_) | BatchEvent::RecordAdded(_) => {}
        }
    }
}
