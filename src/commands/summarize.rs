//! Groups a saved hourly report into periods of the day.

use crate::args::SummarizeArgs;
use crate::Result;
use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Timelike};

const PERIODS: [&str; 6] = [
    "12am-4am", "4am-8am", "8am-12pm", "12pm-4pm", "4pm-8pm", "8pm-12am",
];

/// Reads a file of hourly records (`YYYY-MM-DD HH:MM<TAB>value`) and prints
/// per-day usage totals for each 4-hour period of the day.
pub async fn summarize(args: &SummarizeArgs) -> Result<()> {
    let contents = tokio::fs::read_to_string(args.data_file())
        .await
        .with_context(|| format!("couldn't read {}", args.data_file().display()))?;
    let summaries = summarize_periods(&contents)?;
    print!("{}", render(&summaries));
    Ok(())
}

/// One day's usage, bucketed into 4-hour periods.
struct DaySummary {
    day: NaiveDate,
    period_usage: [f64; 6],
}

fn summarize_periods(contents: &str) -> Result<Vec<DaySummary>> {
    let mut summaries: Vec<DaySummary> = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (label, value) = line
            .split_once('\t')
            .with_context(|| format!("malformed line: {line}"))?;
        let time = match NaiveDateTime::parse_from_str(label, "%Y-%m-%d %H:%M") {
            Ok(time) => time,
            // `water hourly` writes a header row; tolerate one at the top.
            Err(_) if i == 0 => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to parse date: {label}"));
            }
        };
        let usage: f64 = value
            .parse()
            .with_context(|| format!("failed to parse usage: {value}"))?;

        let day = time.date();
        if summaries.last().map(|s| s.day) != Some(day) {
            summaries.push(DaySummary {
                day,
                period_usage: [0.0; 6],
            });
        }
        if let Some(summary) = summaries.last_mut() {
            summary.period_usage[(time.hour() / 4) as usize] += usage;
        }
    }
    Ok(summaries)
}

fn render(summaries: &[DaySummary]) -> String {
    let mut out = String::new();
    out.push_str("date\t");
    out.push_str(&PERIODS.join("\t"));
    out.push('\n');
    for summary in summaries {
        out.push_str(&summary.day.format("%Y-%m-%d").to_string());
        for usage in summary.period_usage {
            out.push_str(&format!("\t{usage:.6}"));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_periods_groups_by_day_and_period() {
        let contents = "Date\tConsumption in GALLONS\n\
2023-04-21 00:00\t10\n\
2023-04-21 03:00\t5\n\
2023-04-21 04:00\t7\n\
2023-04-21 23:00\t2\n\
2023-04-22 12:00\t100\n";
        let summaries = summarize_periods(contents).unwrap();
        assert_eq!(summaries.len(), 2);

        assert_eq!(
            summaries[0].day,
            NaiveDate::from_ymd_opt(2023, 4, 21).unwrap()
        );
        assert_eq!(
            summaries[0].period_usage,
            [15.0, 7.0, 0.0, 0.0, 0.0, 2.0]
        );
        assert_eq!(
            summaries[1].period_usage,
            [0.0, 0.0, 0.0, 100.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_summarize_periods_rejects_bad_rows() {
        // A bad date is only tolerated as the leading header row.
        assert!(summarize_periods("2023-04-21 00:00\t10\njunk\t5\n").is_err());
        assert!(summarize_periods("2023-04-21 00:00\t10\n2023-04-21 01:00\tabc\n").is_err());
        assert!(summarize_periods("no tabs here\n").is_err());
    }

    #[test]
    fn test_render() {
        let summaries = vec![DaySummary {
            day: NaiveDate::from_ymd_opt(2023, 4, 21).unwrap(),
            period_usage: [15.0, 7.0, 0.0, 0.0, 0.0, 2.0],
        }];
        let out = render(&summaries);
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date\t12am-4am\t4am-8am\t8am-12pm\t12pm-4pm\t4pm-8pm\t8pm-12am"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2023-04-21\t15.000000\t7.000000\t0.000000\t0.000000\t0.000000\t2.000000"
        );
    }
}
