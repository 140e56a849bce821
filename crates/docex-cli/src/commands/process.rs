//! Process command - extract fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docex_core::{DocumentExtractionAgent, ExtractionResult};

use super::{clean_field_list, load_config, resolve_api_key};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fields to extract, comma separated (default: per document type)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// API key for the language model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Show extraction confidence and validation notes
    #[arg(long)]
    show_confidence: bool,

    /// Fail when image OCR fails instead of extracting from the error text
    #[arg(long)]
    strict_ocr: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (one row per field)
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.strict_ocr {
        config.reader.strict_ocr = true;
    }
    let api_key = resolve_api_key(args.api_key.clone(), &config)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let filename = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let data = fs::read(&args.input)?;
    let fields = clean_field_list(&args.fields);

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting...");

    // The agent and its blocking HTTP client live entirely on the blocking pool
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<ExtractionResult> {
        let agent = DocumentExtractionAgent::gemini(&api_key, config)?;
        Ok(agent.extract(&data, &filename, fields.as_deref())?)
    })
    .await?;

    pb.finish_and_clear();
    let result = result?;

    let output = format_result(&result, args.format)?;

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

    if args.show_confidence {
        println!();
        println!(
            "{} Document type: {}",
            style("ℹ").blue(),
            result.doc_type
        );
        println!(
            "{} Overall confidence: {:.2}",
            style("ℹ").blue(),
            result.overall_confidence
        );
        if let Some(seconds) = result.processing_time {
            println!("{} Processing time: {:.2}s", style("ℹ").blue(), seconds);
        }
        if !result.qa.notes.is_empty() {
            println!(
                "{} Validation notes: {}",
                style("!").yellow(),
                result.qa.notes
            );
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render an extraction result in the requested format.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(result.to_json_pretty()?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["doc_type", "name", "value", "confidence"])?;
    for field in &result.fields {
        wtr.write_record([
            result.doc_type.as_str(),
            &field.name,
            &field.value,
            &format!("{:.2}", field.confidence()),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document type: {}\n", result.doc_type));
    output.push('\n');

    output.push_str("Fields:\n");
    if result.fields.is_empty() {
        output.push_str("  (none)\n");
    }
    for field in &result.fields {
        output.push_str(&format!(
            "  {}: {} ({:.2})\n",
            field.name,
            field.value,
            field.confidence()
        ));
    }
    output.push('\n');

    output.push_str(&format!(
        "Overall confidence: {:.2}\n",
        result.overall_confidence
    ));
    if result.qa.is_clean() {
        output.push_str("Validation: passed\n");
    } else {
        output.push_str(&format!("Validation: {}\n", result.qa.notes));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use docex_core::{DocType, ExtractedField, QualityAssurance};

    fn sample() -> ExtractionResult {
        ExtractionResult {
            doc_type: DocType::Invoice,
            fields: vec![
                ExtractedField::new("invoice_number", "INV-1, rev 2", 0.7),
                ExtractedField::new("total_amount", "NOT_FOUND", 0.0),
            ],
            overall_confidence: 0.45,
            qa: QualityAssurance {
                passed_rules: vec![
                    "invoice_number_present".to_string(),
                    "total_amount_present".to_string(),
                ],
                failed_rules: vec![],
                notes: String::new(),
            },
            processing_time: Some(0.25),
        }
    }

    #[test]
    fn test_format_csv_quotes_values() {
        let csv = format_result(&sample(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "doc_type,name,value,confidence");
        assert_eq!(lines[1], "invoice,invoice_number,\"INV-1, rev 2\",0.70");
        assert_eq!(lines[2], "invoice,total_amount,NOT_FOUND,0.00");
    }

    #[test]
    fn test_format_text() {
        let text = format_result(&sample(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Document type: invoice\n"));
        assert!(text.contains("  invoice_number: INV-1, rev 2 (0.70)\n"));
        assert!(text.contains("Validation: passed\n"));
    }

    #[test]
    fn test_format_json() {
        let json = format_result(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["doc_type"], "invoice");
        assert_eq!(value["fields"][1]["value"], "NOT_FOUND");
        assert_eq!(value["processing_time"], 0.25);
    }
}
