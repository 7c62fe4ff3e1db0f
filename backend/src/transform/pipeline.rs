//! Directory ingestion pipeline.
//!
//! Combines all steps: file discovery, parsing, normalization, concatenation and
//! writing the normalized artifact.
//!
//! # Example
//!
//! ```rust,ignore
//! use morsel::transform::pipeline::{run_pipeline, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = run_pipeline(&PipelineOptions::default())?;
//!     println!("Wrote {} rows to {}", output.records.len(), output.output_file.display());
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use super::normalize::normalize_rows;
use crate::aggregate::{checked_total, date_range, regions, summary_stats};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::config::{DEFAULT_DATA_DIR, DEFAULT_OUTPUT_FILE, SOURCE_EXTENSION, TARGET_PRODUCT};
use crate::error::{CsvError, PipelineError, PipelineResult};
use crate::models::SalesRecord;
use crate::parser::parse_sales_file;

/// Number of rows shown in the head/tail preview.
const PREVIEW_ROWS: usize = 5;

/// Options for the ingestion pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOptions {
    /// Directory holding the regional source files
    pub data_dir: PathBuf,

    /// Where the normalized table is written
    pub output_file: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

/// Per-file ingestion report
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub total_rows: usize,
    pub matched_rows: usize,
}

/// Result of ingesting a directory, before anything is written
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Normalized rows, file by file in name order
    pub records: Vec<SalesRecord>,
    pub files: Vec<FileReport>,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<SalesRecord>,
    pub files: Vec<FileReport>,
    pub output_file: PathBuf,
}

/// Run the pipeline end to end and write the artifact.
///
/// Nothing is written unless every file parses and at least one row matches.
pub fn run_pipeline(options: &PipelineOptions) -> PipelineResult<PipelineOutput> {
    log_info("📖 Starting data processing...");

    let ingest = ingest_directory(&options.data_dir)?;
    print_summary(&ingest.records);

    write_sales_table(&options.output_file, &ingest.records)?;
    print_preview(&ingest.records);
    log_success(format!("Saved to: {}", options.output_file.display()));

    Ok(PipelineOutput {
        records: ingest.records,
        files: ingest.files,
        output_file: options.output_file.clone(),
    })
}

/// Ingest every recognized file of a directory into one table.
pub fn ingest_directory(dir: &Path) -> PipelineResult<IngestResult> {
    let files = discover_source_files(dir)?;

    let names: Vec<String> = files.iter().map(|f| display_name(f)).collect();
    log_info(format!("Found {} CSV files: {}", files.len(), names.join(", ")));

    let mut records = Vec::new();
    let mut reports = Vec::with_capacity(files.len());

    for file in &files {
        let (mut rows, report) = ingest_file(file)?;
        records.append(&mut rows);
        reports.push(report);
    }

    if records.is_empty() {
        log_error(format!("No '{}' data found in any file!", TARGET_PRODUCT));
        log_error("Check the product names in your CSV files.");
        return Err(PipelineError::NoMatchingRows {
            product: TARGET_PRODUCT.to_string(),
            files: files.len(),
        });
    }

    if checked_total(&records).is_none() {
        log_error("Total sales overflow the decimal range.");
        return Err(PipelineError::SalesOverflow {
            rows: records.len(),
        });
    }

    Ok(IngestResult {
        records,
        files: reports,
    })
}

/// List recognized source files in a directory, sorted by file name.
pub fn discover_source_files(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(PipelineError::MissingResource(dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let recognized = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION));
        if recognized && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(PipelineError::NoInputFiles(dir.to_path_buf()));
    }

    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

/// Parse and normalize one file.
fn ingest_file(file: &Path) -> PipelineResult<(Vec<SalesRecord>, FileReport)> {
    log_info(format!("Processing {}...", display_name(file)));

    let malformed = |source: CsvError| PipelineError::Malformed {
        file: file.to_path_buf(),
        source,
    };

    let parsed = parse_sales_file(file).map_err(malformed)?;
    log_info_indent(format!("Total rows in file: {}", parsed.records.len()), 1);

    let products: BTreeSet<&str> = parsed.records.iter().map(|r| r.product.as_str()).collect();
    let sample: Vec<&str> = products.iter().take(5).copied().collect();
    log_info_indent(format!("Unique products: {}", sample.join(", ")), 1);

    let rows = normalize_rows(&parsed.records, TARGET_PRODUCT).map_err(malformed)?;

    if rows.is_empty() {
        log_warning(format!(
            "No '{}' rows found in {}",
            TARGET_PRODUCT,
            display_name(file)
        ));
    } else {
        log_success(format!("Found {} '{}' rows", rows.len(), TARGET_PRODUCT));
    }

    let report = FileReport {
        file: file.to_path_buf(),
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        total_rows: parsed.records.len(),
        matched_rows: rows.len(),
    };

    Ok((rows, report))
}

/// Write the normalized table with header `sales,date,region`.
pub fn write_sales_table(path: &Path, records: &[SalesRecord]) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Load a previously written artifact.
pub fn load_sales_table(path: &Path) -> PipelineResult<Vec<SalesRecord>> {
    if !path.is_file() {
        return Err(PipelineError::MissingResource(path.to_path_buf()));
    }

    let malformed = |e: csv::Error| PipelineError::Malformed {
        file: path.to_path_buf(),
        source: CsvError::ParseError(e),
    };

    let mut reader = csv::Reader::from_path(path).map_err(malformed)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<SalesRecord>, _>>()
        .map_err(malformed)?;

    Ok(records)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print dataset-wide diagnostics
fn print_summary(records: &[SalesRecord]) {
    log_success(format!("Total '{}' rows: {}", TARGET_PRODUCT, records.len()));

    if let Some((first, last)) = date_range(records) {
        log_info(format!("Date range: {} to {}", first, last));
    }
    log_info(format!("Regions: {}", regions(records).join(", ")));

    let stats = summary_stats(records);
    log_info("📊 Sales Summary:");
    log_info_indent(format!("Total sales: ${:.2}", stats.total), 1);
    if let (Some(mean), Some(max), Some(min)) = (stats.mean, stats.max, stats.min) {
        log_info_indent(format!("Average sales per transaction: ${:.2}", mean), 1);
        log_info_indent(format!("Maximum sale: ${:.2}", max), 1);
        log_info_indent(format!("Minimum sale: ${:.2}", min), 1);
    }
}

/// Print the first and last rows of the table
fn print_preview(records: &[SalesRecord]) {
    let format_row = |r: &SalesRecord| format!("{:>10}  {}  {}", r.sales, r.date, r.region);

    log_info(format!("First {} rows of cleaned data:", PREVIEW_ROWS));
    for record in records.iter().take(PREVIEW_ROWS) {
        log_info_indent(format_row(record), 1);
    }

    log_info(format!("Last {} rows of cleaned data:", PREVIEW_ROWS));
    let skip = records.len().saturating_sub(PREVIEW_ROWS);
    for record in records.iter().skip(skip) {
        log_info_indent(format_row(record), 1);
    }
}
