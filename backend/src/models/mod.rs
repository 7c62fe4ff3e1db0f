//! Domain models for the Morsel sales pipeline.
//!
//! - [`RawTransaction`] - One row of a regional source file, still textual
//! - [`SalesRecord`] - One normalized transaction (`sales`, `date`, `region`)
//! - [`RegionFilter`] - Region selection, including the `all` sentinel
//! - [`SummaryStats`] - Total / mean / count over a subset
//! - [`Comparison`] - Before/after mean change, or insufficient data

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Raw Transaction
// =============================================================================

/// A source row as read from disk, before any conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    /// 1-based line number in the source file (header is line 1).
    pub line: u64,
    pub product: String,
    pub quantity: String,
    pub price: String,
    pub date: String,
    pub region: String,
}

// =============================================================================
// Normalized Transaction
// =============================================================================

/// A normalized transaction of the target product.
///
/// Field order is the column order of the output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// `quantity * price`, no currency symbol.
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
    pub date: NaiveDate,
    pub region: String,
}

impl SalesRecord {
    pub fn new(sales: Decimal, date: NaiveDate, region: impl Into<String>) -> Self {
        Self {
            sales,
            date,
            region: region.into(),
        }
    }
}

// =============================================================================
// Region Filter
// =============================================================================

/// Sentinel selecting every region.
pub const ALL_REGIONS: &str = "all";

/// Region selection for aggregate queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    /// Exact, case-sensitive match on the stored region value.
    Only(String),
}

impl RegionFilter {
    pub fn matches(&self, region: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == region,
        }
    }
}

impl FromStr for RegionFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_REGIONS {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

impl From<Option<String>> for RegionFilter {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(region) if region != ALL_REGIONS => Self::Only(region),
            _ => Self::All,
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_REGIONS),
            Self::Only(region) => f.write_str(region),
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Sales summed over one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub sales: Decimal,
}

/// Rows partitioned around a threshold date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateSplit {
    /// Rows strictly before the threshold.
    pub before: Vec<SalesRecord>,
    /// Rows on or after the threshold.
    pub after: Vec<SalesRecord>,
}

/// Summary statistics over a subset of the table.
///
/// `mean`, `min` and `max` are `None` when the subset is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: Decimal,
    pub mean: Option<Decimal>,
    pub count: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl SummaryStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Direction of the mean sale after the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Higher,
    Lower,
    Unchanged,
}

/// Outcome of a before/after comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Comparison {
    /// One side has no rows (or a zero mean), so no relative change exists.
    #[serde(rename_all = "camelCase")]
    InsufficientData {
        before_count: usize,
        after_count: usize,
    },
    /// Both sides have data.
    #[serde(rename_all = "camelCase")]
    Change {
        threshold: NaiveDate,
        before_mean: Decimal,
        after_mean: Decimal,
        /// `(after - before) / before * 100`.
        percent_change: Decimal,
        trend: Trend,
    },
}

impl Comparison {
    pub fn percent_change(&self) -> Option<Decimal> {
        match self {
            Self::Change { percent_change, .. } => Some(*percent_change),
            Self::InsufficientData { .. } => None,
        }
    }

    /// One-line answer to "did sales go up after the price increase?".
    pub fn headline(&self) -> String {
        match self {
            Self::InsufficientData {
                before_count,
                after_count,
            } => format!(
                "Insufficient data to compare ({} before, {} after)",
                before_count, after_count
            ),
            Self::Change {
                threshold,
                trend,
                percent_change,
                ..
            } => {
                let word = match trend {
                    Trend::Higher => "HIGHER",
                    Trend::Lower => "LOWER",
                    Trend::Unchanged => "UNCHANGED",
                };
                format!(
                    "Sales were {} after the price increase on {} ({:+.2}%)",
                    word,
                    threshold.format("%B %-d, %Y"),
                    percent_change
                )
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_filter_parse() {
        assert_eq!("all".parse::<RegionFilter>().unwrap(), RegionFilter::All);
        assert_eq!(
            "south".parse::<RegionFilter>().unwrap(),
            RegionFilter::Only("south".into())
        );
        // The sentinel is case-sensitive like the regions themselves.
        assert_eq!(
            "All".parse::<RegionFilter>().unwrap(),
            RegionFilter::Only("All".into())
        );
    }

    #[test]
    fn test_region_filter_from_option() {
        assert_eq!(RegionFilter::from(None), RegionFilter::All);
        assert_eq!(RegionFilter::from(Some("all".to_string())), RegionFilter::All);
        assert_eq!(
            RegionFilter::from(Some("east".to_string())),
            RegionFilter::Only("east".into())
        );
    }

    #[test]
    fn test_region_filter_matches_exactly() {
        let filter = RegionFilter::Only("north".into());
        assert!(filter.matches("north"));
        assert!(!filter.matches("North"));
        assert!(RegionFilter::All.matches("anything"));
    }

    #[test]
    fn test_headline_lower() {
        let comparison = Comparison::Change {
            threshold: NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
            before_mean: Decimal::new(1000, 2),
            after_mean: Decimal::new(750, 2),
            percent_change: Decimal::new(-25, 0),
            trend: Trend::Lower,
        };
        let text = comparison.headline();
        assert!(text.contains("LOWER"));
        assert!(text.contains("January 15, 2021"));
        assert!(text.contains("-25.00%"));
    }

    #[test]
    fn test_comparison_serialization_tag() {
        let comparison = Comparison::InsufficientData {
            before_count: 0,
            after_count: 4,
        };
        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json["status"], "insufficientData");
        assert_eq!(json["afterCount"], 4);
        assert!(comparison.percent_change().is_none());
    }
}
