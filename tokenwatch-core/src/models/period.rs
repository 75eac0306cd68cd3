//! Reporting periods.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A relative reporting period ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    #[default]
    Week,
    /// Last 30 days.
    Month,
    /// Last 90 days.
    Quarter,
    /// Last 365 days.
    Year,
    /// Everything (capped at 5 years, the practical API limit).
    All,
}

impl Period {
    /// Short label as used on the command line (`7d`, `30d`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Period::Day => "1d",
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Quarter => "90d",
            Period::Year => "1y",
            Period::All => "all",
        }
    }

    /// Number of days covered by this period.
    pub fn days(&self) -> i64 {
        match self {
            Period::Day => 1,
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
            Period::Year => 365,
            Period::All => 1825,
        }
    }

    /// Resolves the period to a concrete `[start, end]` window ending now.
    pub fn time_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::days(self.days()), end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" | "day" => Ok(Period::Day),
            "7d" | "week" => Ok(Period::Week),
            "30d" | "month" => Ok(Period::Month),
            "90d" | "quarter" => Ok(Period::Quarter),
            "1y" | "365d" | "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown period '{other}' (expected 1d, 7d, 30d, 90d, 1y, or all)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!("7d".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("30d".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("ALL".parse::<Period>().unwrap(), Period::All);
        assert!("14d".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_window_length() {
        let (start, end) = Period::Week.time_range();
        assert_eq!((end - start).num_days(), 7);
    }

    #[test]
    fn test_period_label_roundtrip() {
        for period in [
            Period::Day,
            Period::Week,
            Period::Month,
            Period::Quarter,
            Period::Year,
            Period::All,
        ] {
            assert_eq!(period.label().parse::<Period>().unwrap(), period);
        }
    }
}
