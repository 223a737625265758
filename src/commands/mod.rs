//! Command handlers for the water CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod daily;
mod hourly;
mod monitor;
mod summarize;

pub use daily::daily;
pub use hourly::hourly;
pub use monitor::monitor;
pub use summarize::summarize;

use crate::Result;
use anyhow::Context;
use chrono::{Local, Months, NaiveDate};

/// Parses a `YYYYMM` month into a `[first-of-month, first-of-next-month)`
/// range, clamped so it doesn't extend past today.
pub(crate) fn month_range(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::parse_from_str(&format!("{month}01"), "%Y%m%d")
        .with_context(|| format!("failed to parse month {month}"))?;
    let mut end = start + Months::new(1);
    let today = Local::now().date_naive();
    if end > today {
        end = today;
    }
    Ok((start, end))
}
