//! Application configuration.
//!
//! Defaults are compile-time constants. [`Settings::from_env`] overrides them from
//! `MORSEL_*` environment variables (a `.env` file is loaded by the binary first),
//! and CLI flags override the settings in turn.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Product line retained by the pipeline, compared case-insensitively.
pub const TARGET_PRODUCT: &str = "pink morsel";

/// Date of the Pink Morsel price increase.
pub const PRICE_INCREASE_DATE: &str = "2021-01-15";

/// Directory holding the per-region source files.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Normalized output artifact.
pub const DEFAULT_OUTPUT_FILE: &str = "formatted_sales_data.csv";

/// Port for the JSON query API.
pub const DEFAULT_PORT: u16 = 8050;

/// Extension of recognized source files.
pub const SOURCE_EXTENSION: &str = "csv";

/// Runtime settings resolved from defaults and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_file: PathBuf,
    pub port: u16,
    pub threshold_date: NaiveDate,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            port: DEFAULT_PORT,
            threshold_date: price_increase_date(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings with an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(dir) = lookup("MORSEL_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(output) = lookup("MORSEL_OUTPUT") {
            settings.output_file = PathBuf::from(output);
        }
        if let Some(port) = lookup("MORSEL_PORT") {
            settings.port = parse_var("MORSEL_PORT", &port)?;
        }
        if let Some(date) = lookup("MORSEL_THRESHOLD_DATE") {
            settings.threshold_date = parse_date(&date).map_err(|e| ConfigError::InvalidVar {
                var: "MORSEL_THRESHOLD_DATE",
                value: date.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(settings)
    }
}

/// The price-increase date as a calendar date.
pub fn price_increase_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 15).expect("price increase date is valid")
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 8050);
        assert_eq!(settings.output_file, PathBuf::from("formatted_sales_data.csv"));
    }

    #[test]
    fn test_price_increase_constant_matches() {
        assert_eq!(parse_date(PRICE_INCREASE_DATE).unwrap(), price_increase_date());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("MORSEL_DATA_DIR", "/srv/sales"),
            ("MORSEL_PORT", "9000"),
            ("MORSEL_THRESHOLD_DATE", "2021-02-01"),
        ]))
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/srv/sales"));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.threshold_date, NaiveDate::from_ymd_opt(2021, 2, 1).unwrap());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = Settings::from_lookup(lookup(&[("MORSEL_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("MORSEL_PORT"));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = Settings::from_lookup(lookup(&[("MORSEL_THRESHOLD_DATE", "15/01/2021")]))
            .unwrap_err();
        assert!(err.to_string().contains("MORSEL_THRESHOLD_DATE"));
    }
}
