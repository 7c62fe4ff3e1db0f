//! Transformation module.
//!
//! - Normalize: product filter, price cleanup, sales computation
//! - Pipeline: directory ingestion and the normalized artifact

pub mod normalize;
pub mod pipeline;

pub use normalize::{is_target_product, normalize_row, normalize_rows, parse_price, parse_quantity};
pub use pipeline::*;
