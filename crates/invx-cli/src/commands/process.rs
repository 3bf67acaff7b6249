//! Process command - extract fields from a single invoice image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invx_core::export::{ExportRow, write_csv};
use invx_core::{CanonicalField, InvoiceExtractor, InvoiceFields, MediaType, VisionExtractor};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Return canned results instead of calling the model
    #[arg(long)]
    mock: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.mock {
        config.vision.mock = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let image = fs::read(&args.input)?;
    let media_type = MediaType::from_path(&args.input);

    let extractor = VisionExtractor::from_config(&config.vision, &config.extraction)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Extracting {}", args.input.display()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = extractor.extract(&image, media_type).await;
    pb.finish_and_clear();
    let fields = result?;

    let flagged = fields.flagged();
    if !flagged.is_empty() {
        eprintln!("{}", style("Fields needing review:").yellow());
        for field in &flagged {
            eprintln!("  - {}", field.label());
        }
    }

    let output = format_fields(&fields, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_fields(fields: &InvoiceFields, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
        OutputFormat::Csv => Ok(write_csv(&[ExportRow::from(fields)])?),
        OutputFormat::Text => Ok(format_text(fields)),
    }
}

fn format_text(fields: &InvoiceFields) -> String {
    let mut output = String::new();
    for field in CanonicalField::ALL {
        let label = format!("{}:", field.label());
        output.push_str(&format!("{:<19}{}\n", label, fields.get(field)));
    }
    output
}
