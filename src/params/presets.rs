//! Relative date presets for `date-relative` parameters
//!
//! Dates are computed on the caller's local calendar, not UTC.

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDatePreset {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    ThisYear,
}

impl FromStr for RelativeDatePreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last_7_days" => Ok(Self::Last7Days),
            "last_30_days" => Ok(Self::Last30Days),
            "this_month" => Ok(Self::ThisMonth),
            "this_year" => Ok(Self::ThisYear),
            _ => Err(()),
        }
    }
}

/// Inclusive `YYYY-MM-DD` range; both empty when unresolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: from.format("%Y-%m-%d").to_string(),
            to: to.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty()
    }
}

impl RelativeDatePreset {
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);

        match self {
            Self::Today => DateRange::new(today, today),
            Self::Yesterday => {
                let y = days_ago(1);
                DateRange::new(y, y)
            }
            Self::Last7Days => DateRange::new(days_ago(6), today),
            Self::Last30Days => DateRange::new(days_ago(29), today),
            Self::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let last = first
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(today);
                DateRange::new(first, last)
            }
            Self::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                DateRange::new(first, last)
            }
        }
    }
}

/// Resolve a preset key relative to `today`. Unknown or empty keys yield an
/// empty range rather than an error.
pub fn resolve_relative_date(preset: &str, today: NaiveDate) -> DateRange {
    preset
        .parse::<RelativeDatePreset>()
        .map(|p| p.resolve(today))
        .unwrap_or_default()
}

/// Resolve a preset key against the local calendar's current date
pub fn resolve_relative_date_now(preset: &str) -> DateRange {
    resolve_relative_date(preset, Local::now().date_naive())
}

/// The `{name}_from` / `{name}_to` companion values for a resolved range
pub fn relative_date_companions(name: &str, range: &DateRange) -> [(String, Value); 2] {
    [
        (format!("{}_from", name), Value::from(range.from.as_str())),
        (format!("{}_to", name), Value::from(range.to.as_str())),
    ]
}
