//! Row-level normalization: product filter, price cleanup and sales computation.
//!
//! ```text
//! RawTransaction                                   SalesRecord
//! ┌──────────────────────────────────────┐        ┌───────────────────────────┐
//! │ Pink Morsel, 5, $2.00, 2021-01-10, n │  ───▶  │ 10.00, 2021-01-10, north  │
//! │ Other,       1, $1.00, 2021-01-10, n │  ───▶  │ (dropped)                 │
//! └──────────────────────────────────────┘        └───────────────────────────┘
//! ```

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::config::parse_date;
use crate::error::{CsvError, CsvResult};
use crate::models::{RawTransaction, SalesRecord};

/// Leading currency symbol(s), then a plain decimal amount.
static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\d\s.+-]*\s*(?P<amount>[+-]?(?:\d+(?:\.\d*)?|\.\d+))$")
        .expect("price pattern is valid")
});

/// Whether a product name is the target product, ignoring case and padding.
pub fn is_target_product(product: &str, target: &str) -> bool {
    product.trim().to_lowercase() == target.trim().to_lowercase()
}

/// Strip the currency prefix from a price and parse the amount.
///
/// `"$2.50"` → `2.50`. Anything that does not reduce to a plain decimal is an error.
pub fn parse_price(raw: &str) -> Result<Decimal, String> {
    let caps = PRICE_PATTERN
        .captures(raw.trim())
        .ok_or_else(|| "expected a currency symbol followed by a decimal amount".to_string())?;

    Decimal::from_str(&caps["amount"]).map_err(|e| e.to_string())
}

/// Parse an integer-like quantity (`"5"`, `"5.0"`).
pub fn parse_quantity(raw: &str) -> Result<Decimal, String> {
    let quantity = Decimal::from_str(raw.trim()).map_err(|e| e.to_string())?;
    if !quantity.fract().is_zero() {
        return Err("quantity must be a whole number".to_string());
    }
    Ok(quantity.trunc())
}

/// Normalize one row.
///
/// Returns `Ok(None)` for rows of other products; those are never converted, so a
/// malformed price on a dropped row is not an error.
pub fn normalize_row(row: &RawTransaction, target: &str) -> CsvResult<Option<SalesRecord>> {
    if !is_target_product(&row.product, target) {
        return Ok(None);
    }

    let quantity = parse_quantity(&row.quantity)
        .map_err(|msg| CsvError::invalid_value(row.line, "quantity", &row.quantity, msg))?;
    let price = parse_price(&row.price)
        .map_err(|msg| CsvError::invalid_value(row.line, "price", &row.price, msg))?;
    let date: NaiveDate = parse_date(&row.date).map_err(|e| {
        CsvError::invalid_value(row.line, "date", &row.date, format!("expected YYYY-MM-DD ({})", e))
    })?;

    let region = row.region.trim();
    if region.is_empty() {
        return Err(CsvError::invalid_value(row.line, "region", &row.region, "region is empty"));
    }

    let sales = quantity
        .checked_mul(price)
        .ok_or_else(|| CsvError::invalid_value(row.line, "price", &row.price, "sales overflow"))?;

    Ok(Some(SalesRecord::new(sales, date, region)))
}

/// Normalize every row of one file, preserving order.
///
/// Stops at the first malformed retained row.
pub fn normalize_rows(rows: &[RawTransaction], target: &str) -> CsvResult<Vec<SalesRecord>> {
    let mut out = Vec::new();
    for row in rows {
        if let Some(record) = normalize_row(row, target)? {
            out.push(record);
        }
    }
    Ok(out)
}
