//! # Morsel - Pink Morsel sales ingestion and analysis
//!
//! Reads per-region transaction files, keeps the Pink Morsel rows, computes
//! revenue per transaction and answers the question "were sales higher after the
//! price increase on 2021-01-15?".
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ data/*.csv  │────▶│   Parser    │────▶│  Normalize  │────▶│ sales,date, │
//! │ (per region)│     │  (auto-enc) │     │ (filter, $) │     │ region CSV  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                         ┌─────────────┐            │
//!                                         │  Aggregate  │◀───────────┘
//!                                         │ (CLI / API) │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use morsel::{compare_before_after, price_increase_date, run_pipeline, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = run_pipeline(&PipelineOptions::default())?;
//!     let comparison = compare_before_after(&output.records, price_increase_date());
//!     println!("{}", comparison.headline());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`config`] - Constants and environment settings
//! - [`models`] - Raw and normalized records, aggregate results
//! - [`parser`] - Source file parsing with auto-detection
//! - [`transform`] - Normalization and the ingestion pipeline
//! - [`aggregate`] - Pure queries over the normalized table
//! - [`api`] - HTTP query API and log stream

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Queries
pub mod aggregate;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors and configuration
// =============================================================================

pub use config::{price_increase_date, Settings, PRICE_INCREASE_DATE, TARGET_PRODUCT};
pub use error::{ConfigError, CsvError, ErrorKind, PipelineError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Comparison, DailyTotal, DateSplit, RawTransaction, RegionFilter, SalesRecord, SummaryStats,
    Trend, ALL_REGIONS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_sales_file,
    ParseResult,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    ingest_directory, load_sales_table, run_pipeline, write_sales_table, FileReport,
    IngestResult, PipelineOptions, PipelineOutput,
};

// =============================================================================
// Re-exports - Aggregates
// =============================================================================

pub use aggregate::{
    checked_total, compare_before_after, daily_totals, date_range, filter_by_region, regions,
    split_by_threshold_date, summary_stats,
};

// Server
pub mod server {
    pub use crate::api::server::{load_for_serving, start_server};
}
