//! REST API payloads for the chart front end.
//!
//! Field names are camelCase for JavaScript consumers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Comparison, DailyTotal, SummaryStats};
use crate::transform::pipeline::{FileReport, PipelineOutput};

/// Query string shared by the aggregate endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionQuery {
    /// Region value, or `all` / absent for every region
    pub region: Option<String>,
}

/// Query string of the comparison endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonQuery {
    pub region: Option<String>,
    /// `YYYY-MM-DD`; defaults to the configured threshold date
    pub threshold: Option<String>,
}

/// Chart series: sales per day for one region selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySalesResponse {
    pub region: String,
    pub points: Vec<DailyTotal>,
}

/// Summary of one region selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub region: String,
    pub total_sales: Decimal,
    /// `null` when there are no transactions
    pub mean_sale: Option<Decimal>,
    pub transaction_count: usize,
    pub min_sale: Option<Decimal>,
    pub max_sale: Option<Decimal>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl SummaryResponse {
    pub fn new(region: String, stats: SummaryStats, range: Option<(NaiveDate, NaiveDate)>) -> Self {
        Self {
            region,
            total_sales: stats.total,
            mean_sale: stats.mean,
            transaction_count: stats.count,
            min_sale: stats.min,
            max_sale: stats.max,
            first_date: range.map(|(first, _)| first),
            last_date: range.map(|(_, last)| last),
        }
    }
}

/// Before/after comparison for one region selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    pub region: String,
    pub threshold: NaiveDate,
    pub comparison: Comparison,
    pub headline: String,
}

impl ComparisonResponse {
    pub fn new(region: String, threshold: NaiveDate, comparison: Comparison) -> Self {
        let headline = comparison.headline();
        Self {
            region,
            threshold,
            comparison,
            headline,
        }
    }
}

/// Result of a reprocess request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub run_id: String,
    pub status: String,
    pub row_count: usize,
    pub output_file: String,
    pub files: Vec<FileSummary>,
}

/// Per-file line of a [`ProcessResponse`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub file: String,
    pub encoding: String,
    pub delimiter: String,
    pub total_rows: usize,
    pub matched_rows: usize,
}

impl From<&FileReport> for FileSummary {
    fn from(report: &FileReport) -> Self {
        Self {
            file: report.file.display().to_string(),
            encoding: report.encoding.clone(),
            delimiter: report.delimiter.to_string(),
            total_rows: report.total_rows,
            matched_rows: report.matched_rows,
        }
    }
}

impl From<&PipelineOutput> for ProcessResponse {
    fn from(output: &PipelineOutput) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            row_count: output.records.len(),
            output_file: output.output_file.display().to_string(),
            files: output.files.iter().map(FileSummary::from).collect(),
        }
    }
}

/// Create an error response
pub fn error_response(kind: &str, error: &str) -> Value {
    json!({
        "runId": Uuid::new_v4().to_string(),
        "status": "error",
        "kind": kind,
        "error": error,
    })
}
