//! Retrieval orchestration: drives a portal session across a sequence of
//! date batches and reassembles the exports into one chronological report.
//!
//! Batches run strictly in order because each depends on the session's
//! navigation state, and any batch failure aborts the whole retrieval; a
//! partial report is never returned.

mod daily;
mod hourly;

pub use daily::download_daily;
pub use hourly::download_hourly;

use crate::Result;
use anyhow::{bail, Context};
use chrono::{Days, NaiveDate};

/// One bounded `[start, end)` sub-range submitted as a single form/export
/// round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchWindow {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

/// Splits `[start, end)` into consecutive windows of at most `max_days`
/// days each.
pub(crate) fn batch_windows(start: NaiveDate, end: NaiveDate, max_days: u64) -> Vec<BatchWindow> {
    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let batch_end = (cursor + Days::new(max_days)).min(end);
        windows.push(BatchWindow {
            start: cursor,
            end: batch_end,
        });
        cursor = batch_end;
    }
    windows
}

/// Recombines a `M/D` export label with the batch's year into an absolute
/// `YYYY-MM-DD` label. The export omits the year, so it has to be carried in
/// from the requested window.
pub(crate) fn relabel_daily(label: &str, year: i32) -> Result<String> {
    let datetime = format!("{year} {label}");
    let date = NaiveDate::parse_from_str(&datetime, "%Y %m/%d")
        .with_context(|| format!("failed to parse {datetime}"))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Recombines an `H AM/PM` export label with the batch's date into an
/// absolute `YYYY-MM-DD HH:MM` label in 24-hour form.
pub(crate) fn relabel_hourly(label: &str, date: NaiveDate) -> Result<String> {
    let (clock, meridiem) = label
        .trim()
        .split_once(' ')
        .with_context(|| format!("failed to parse hour label {label}"))?;
    let clock: u32 = clock
        .parse()
        .with_context(|| format!("failed to parse hour label {label}"))?;
    if !(1..=12).contains(&clock) {
        bail!("hour out of range in label {label}");
    }
    let hour = match meridiem {
        "AM" => clock % 12,
        "PM" => clock % 12 + 12,
        _ => bail!("unexpected meridiem in label {label}"),
    };
    let datetime = date
        .and_hms_opt(hour, 0, 0)
        .with_context(|| format!("invalid hour in label {label}"))?;
    Ok(datetime.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_batch_windows_61_days() {
        // 61 days must split into 30 + 30 + 1.
        let windows = batch_windows(date(2023, 3, 1), date(2023, 5, 1), 30);
        assert_eq!(
            windows,
            vec![
                BatchWindow {
                    start: date(2023, 3, 1),
                    end: date(2023, 3, 31)
                },
                BatchWindow {
                    start: date(2023, 3, 31),
                    end: date(2023, 4, 30)
                },
                BatchWindow {
                    start: date(2023, 4, 30),
                    end: date(2023, 5, 1)
                },
            ]
        );
        for window in &windows {
            assert!((window.end - window.start).num_days() <= 30);
        }
    }

    #[test]
    fn test_batch_windows_empty_range() {
        assert!(batch_windows(date(2023, 5, 1), date(2023, 5, 1), 30).is_empty());
        assert!(batch_windows(date(2023, 5, 2), date(2023, 5, 1), 30).is_empty());
    }

    #[test]
    fn test_relabel_daily() {
        assert_eq!(relabel_daily("4/21", 2023).unwrap(), "2023-04-21");
        assert_eq!(relabel_daily("12/9", 1999).unwrap(), "1999-12-09");
    }

    #[test]
    fn test_relabel_daily_invalid() {
        assert!(relabel_daily("13/45", 2023).is_err());
        assert!(relabel_daily("2/30", 2023).is_err());
        assert!(relabel_daily("not a date", 2023).is_err());
    }

    #[test]
    fn test_relabel_hourly() {
        let day = date(2023, 4, 21);
        assert_eq!(relabel_hourly("3 PM", day).unwrap(), "2023-04-21 15:00");
        assert_eq!(relabel_hourly("3 AM", day).unwrap(), "2023-04-21 03:00");
        // Midnight and noon are the usual 12-hour clock traps.
        assert_eq!(relabel_hourly("12 AM", day).unwrap(), "2023-04-21 00:00");
        assert_eq!(relabel_hourly("12 PM", day).unwrap(), "2023-04-21 12:00");
    }

    #[test]
    fn test_relabel_hourly_invalid() {
        let day = date(2023, 4, 21);
        assert!(relabel_hourly("13 PM", day).is_err());
        assert!(relabel_hourly("0 AM", day).is_err());
        assert!(relabel_hourly("3 XM", day).is_err());
        assert!(relabel_hourly("noon", day).is_err());
    }
}
