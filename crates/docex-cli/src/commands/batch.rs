//! Batch processing command for multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use docex_core::reader::is_supported;
use docex_core::{DocumentExtractionAgent, ExtractionResult};

use super::process::{OutputFormat, format_result};
use super::{clean_field_list, load_config, resolve_api_key};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fields to extract, comma separated (default: per document type)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// API key for the language model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processed_at: DateTime<Local>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let api_key = resolve_api_key(args.api_key.clone(), &config)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(is_supported))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let fields = clean_field_list(&args.fields);
    let continue_on_error = args.continue_on_error;
    let worker_pb = pb.clone();

    // Files are processed sequentially on the blocking pool
    let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<ProcessResult>> {
        let agent = DocumentExtractionAgent::gemini(&api_key, config)?;
        let mut results = Vec::with_capacity(files.len());

        for path in files {
            let outcome = process_single_file(&agent, &path, fields.as_deref());
            let processed_at = Local::now();

            match outcome {
                Ok(result) => results.push(ProcessResult {
                    path,
                    result: Some(result),
                    error: None,
                    processed_at,
                }),
                Err(e) if continue_on_error => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(e.to_string()),
                        processed_at,
                    });
                }
                Err(e) => {
                    error!("Failed to process {}: {}", path.display(), e);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), e);
                }
            }

            worker_pb.inc(1);
        }

        Ok(results)
    })
    .await??;

    pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.result.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for entry in &successful {
            if let Some(result) = &entry.result {
                let output_path = output_path_for(output_dir, &entry.path, args.format);
                fs::write(&output_path, format_result(result, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &failed {
            println!(
                "  - {}: {}",
                entry.path.display(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    agent: &DocumentExtractionAgent,
    path: &Path,
    fields: Option<&[String]>,
) -> anyhow::Result<ExtractionResult> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let data = fs::read(path)?;
    Ok(agent.extract(&data, filename, fields)?)
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    output_dir.join(format!("{}.{}", stem, format.extension()))
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_summary_records(&mut wtr, results)?;
    wtr.flush()?;
    Ok(())
}

fn write_summary_records<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    results: &[ProcessResult],
) -> anyhow::Result<()> {
    wtr.write_record([
        "filename",
        "status",
        "doc_type",
        "field_count",
        "overall_confidence",
        "failed_rules",
        "processing_time_s",
        "processed_at",
        "error",
    ])?;

    for entry in results {
        let filename = entry
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let processed_at = entry.processed_at.to_rfc3339();

        if let Some(result) = &entry.result {
            wtr.write_record([
                filename,
                "success",
                result.doc_type.as_str(),
                &result.fields.len().to_string(),
                &format!("{:.2}", result.overall_confidence),
                &result.qa.failed_rules.join(";"),
                &result
                    .processing_time
                    .map(|t| format!("{:.3}", t))
                    .unwrap_or_default(),
                &processed_at,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &processed_at,
                entry.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    Ok(())
}
