//! Aggregate queries over the normalized sales table.
//!
//! Every function takes the table by reference and returns a fresh value; nothing
//! here touches the filesystem or keeps state between calls.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Comparison, DailyTotal, DateSplit, RegionFilter, SalesRecord, SummaryStats, Trend};

/// Rows of one region, or every row for [`RegionFilter::All`].
///
/// An unknown region yields an empty table.
pub fn filter_by_region(table: &[SalesRecord], region: &RegionFilter) -> Vec<SalesRecord> {
    table
        .iter()
        .filter(|r| region.matches(&r.region))
        .cloned()
        .collect()
}

/// Sum of `sales`, or `None` when it does not fit a `Decimal`.
pub fn checked_total(table: &[SalesRecord]) -> Option<Decimal> {
    table
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r.sales))
}

/// Sales summed per date, ascending. Sums saturate at the `Decimal` bounds.
pub fn daily_totals(table: &[SalesRecord]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for record in table {
        let total = by_date.entry(record.date).or_default();
        *total = total.saturating_add(record.sales);
    }

    by_date
        .into_iter()
        .map(|(date, sales)| DailyTotal { date, sales })
        .collect()
}

/// Partition rows into `date < threshold` and `date >= threshold`.
pub fn split_by_threshold_date(table: &[SalesRecord], threshold: NaiveDate) -> DateSplit {
    let (before, after): (Vec<_>, Vec<_>) = table.iter().cloned().partition(|r| r.date < threshold);
    DateSplit { before, after }
}

/// Total, mean, count, min and max of `sales`.
///
/// When the total overflows it saturates and `mean` is `None`.
pub fn summary_stats(table: &[SalesRecord]) -> SummaryStats {
    let count = table.len();
    let exact = checked_total(table);

    let total = exact.unwrap_or_else(|| {
        table
            .iter()
            .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.sales))
    });
    let mean = match exact {
        Some(total) if count > 0 => total.checked_div(Decimal::from(count)),
        _ => None,
    };

    SummaryStats {
        total,
        mean,
        count,
        min: table.iter().map(|r| r.sales).min(),
        max: table.iter().map(|r| r.sales).max(),
    }
}

/// Relative change of the mean sale from before to after `threshold`.
pub fn compare_before_after(table: &[SalesRecord], threshold: NaiveDate) -> Comparison {
    let split = split_by_threshold_date(table, threshold);
    let before = summary_stats(&split.before);
    let after = summary_stats(&split.after);

    let insufficient = Comparison::InsufficientData {
        before_count: before.count,
        after_count: after.count,
    };

    let (Some(before_mean), Some(after_mean)) = (before.mean, after.mean) else {
        return insufficient;
    };

    let percent_change = match (after_mean - before_mean)
        .checked_div(before_mean)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(change) => change.normalize(),
        None => return insufficient,
    };

    let trend = match after_mean.cmp(&before_mean) {
        std::cmp::Ordering::Greater => Trend::Higher,
        std::cmp::Ordering::Less => Trend::Lower,
        std::cmp::Ordering::Equal => Trend::Unchanged,
    };

    Comparison::Change {
        threshold,
        before_mean,
        after_mean,
        percent_change,
        trend,
    }
}

/// First and last date present.
pub fn date_range(table: &[SalesRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let first = table.iter().map(|r| r.date).min()?;
    let last = table.iter().map(|r| r.date).max()?;
    Some((first, last))
}

/// Distinct regions, sorted.
pub fn regions(table: &[SalesRecord]) -> Vec<String> {
    table
        .iter()
        .map(|r| r.region.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(sales: &str, date: &str, region: &str) -> SalesRecord {
        SalesRecord::new(dec(sales), day(date), region)
    }

    /// The normalized output of the two-file scenario.
    fn scenario() -> Vec<SalesRecord> {
        vec![
            record("10.00", "2021-01-10", "north"),
            record("7.50", "2021-01-20", "south"),
        ]
    }

    #[test]
    fn test_filter_all_returns_everything() {
        let table = scenario();
        assert_eq!(filter_by_region(&table, &RegionFilter::All), table);
        assert!(filter_by_region(&[], &RegionFilter::All).is_empty());
    }

    #[test]
    fn test_filter_by_region() {
        let table = scenario();
        let south = filter_by_region(&table, &RegionFilter::Only("south".into()));
        assert_eq!(south, vec![record("7.50", "2021-01-20", "south")]);

        let east = filter_by_region(&table, &RegionFilter::Only("east".into()));
        assert!(east.is_empty());

        // Case-sensitive on the stored value.
        let upper = filter_by_region(&table, &RegionFilter::Only("South".into()));
        assert!(upper.is_empty());
    }

    #[test]
    fn test_daily_totals_sorted_and_summed() {
        let table = vec![
            record("3.00", "2021-01-12", "north"),
            record("1.50", "2021-01-10", "south"),
            record("2.25", "2021-01-12", "east"),
            record("4.00", "2021-01-10", "west"),
        ];
        let totals = daily_totals(&table);

        assert_eq!(
            totals,
            vec![
                DailyTotal { date: day("2021-01-10"), sales: dec("5.50") },
                DailyTotal { date: day("2021-01-12"), sales: dec("5.25") },
            ]
        );
    }

    #[test]
    fn test_split_by_threshold() {
        let table = scenario();
        let split = split_by_threshold_date(&table, day("2021-01-15"));
        assert_eq!(split.before.len(), 1);
        assert_eq!(split.after.len(), 1);

        // Rows on the threshold date belong to "after".
        let on = split_by_threshold_date(&table, day("2021-01-20"));
        assert_eq!(on.after, vec![record("7.50", "2021-01-20", "south")]);
    }

    #[test]
    fn test_split_outside_range() {
        let table = scenario();
        let early = split_by_threshold_date(&table, day("2000-01-01"));
        assert!(early.before.is_empty());
        assert_eq!(early.after.len(), 2);

        let late = split_by_threshold_date(&table, day("2030-01-01"));
        assert_eq!(late.before.len(), 2);
        assert!(late.after.is_empty());
    }

    #[test]
    fn test_summary_stats() {
        let stats = summary_stats(&scenario());
        assert_eq!(stats.total, dec("17.50"));
        assert_eq!(stats.mean, Some(dec("8.75")));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, Some(dec("7.50")));
        assert_eq!(stats.max, Some(dec("10.00")));
    }

    #[test]
    fn test_summary_stats_empty_has_no_mean() {
        let stats = summary_stats(&[]);
        assert!(stats.is_empty());
        assert_eq!(stats.total, Decimal::ZERO);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.min, None);
    }

    #[test]
    fn test_compare_before_after() {
        let comparison = compare_before_after(&scenario(), day("2021-01-15"));
        match comparison {
            Comparison::Change {
                before_mean,
                after_mean,
                percent_change,
                trend,
                ..
            } => {
                assert_eq!(before_mean, dec("10.00"));
                assert_eq!(after_mean, dec("7.50"));
                assert_eq!(percent_change, dec("-25"));
                assert_eq!(trend, Trend::Lower);
            }
            other => panic!("expected a change, got {other:?}"),
        }
    }

    /// Two sales whose sum exceeds `Decimal::MAX`.
    fn oversized() -> Vec<SalesRecord> {
        vec![
            record("50000000000000000000000000000", "2021-01-20", "north"),
            record("50000000000000000000000000000", "2021-01-20", "north"),
        ]
    }

    #[test]
    fn test_overflowing_sums_do_not_panic() {
        let table = oversized();
        assert_eq!(checked_total(&table), None);

        let stats = summary_stats(&table);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total, Decimal::MAX);
        assert_eq!(stats.mean, None);

        let totals = daily_totals(&table);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].sales, Decimal::MAX);
    }

    #[test]
    fn test_compare_overflowing_side_is_insufficient() {
        let mut table = oversized();
        table.push(record("1.00", "2021-01-10", "north"));

        let comparison = compare_before_after(&table, day("2021-01-15"));
        assert_eq!(
            comparison,
            Comparison::InsufficientData {
                before_count: 1,
                after_count: 2
            }
        );
    }

    #[test]
    fn test_compare_no_before_rows_is_insufficient() {
        let comparison = compare_before_after(&scenario(), day("2000-01-01"));
        assert_eq!(
            comparison,
            Comparison::InsufficientData {
                before_count: 0,
                after_count: 2
            }
        );
    }

    #[test]
    fn test_compare_no_after_rows_is_insufficient() {
        let comparison = compare_before_after(&scenario(), day("2030-01-01"));
        assert!(comparison.percent_change().is_none());
    }

    #[test]
    fn test_compare_zero_before_mean_is_insufficient() {
        let table = vec![
            record("0.00", "2021-01-10", "north"),
            record("5.00", "2021-01-20", "north"),
        ];
        let comparison = compare_before_after(&table, day("2021-01-15"));
        assert!(matches!(comparison, Comparison::InsufficientData { .. }));
    }

    #[test]
    fn test_compare_on_filtered_region() {
        let table = scenario();
        let south = filter_by_region(&table, &RegionFilter::Only("south".into()));
        let comparison = compare_before_after(&south, day("2021-01-15"));
        assert_eq!(
            comparison,
            Comparison::InsufficientData {
                before_count: 0,
                after_count: 1
            }
        );
    }

    #[test]
    fn test_date_range_and_regions() {
        let table = scenario();
        assert_eq!(date_range(&table), Some((day("2021-01-10"), day("2021-01-20"))));
        assert_eq!(regions(&table), vec!["north", "south"]);
        assert_eq!(date_range(&[]), None);
    }
}
