use crate::model::{Record, Report};
use crate::portal::{self, Credentials, Mode, Portal, PortalConfig, ReportKind};
use crate::retrieve::{batch_windows, relabel_daily, BatchWindow};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, Local, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The widest date range the portal accepts for a single daily export.
const MAX_BATCH_DAYS: u64 = 30;

/// Downloads a report of daily water usage for `[start, end)`.
///
/// Passing `None` for `start` skips the date fields entirely and takes the
/// portal's default current window in a single batch. When both bounds are
/// given they must fall in the same calendar year, because the export labels
/// carry no year of their own.
pub async fn download_daily(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    creds: &Credentials,
    config: &PortalConfig,
    mode: Mode,
    cancel: &CancellationToken,
) -> Result<Report> {
    let mut portal = portal::connect(config, mode).await?;
    daily_report(portal.as_mut(), start, end, creds, cancel).await
}

/// Drives `portal` through a daily retrieval: one login, one menu selection,
/// then one export per 30-day window, merged in traversal order.
pub(crate) async fn daily_report(
    portal: &mut (dyn Portal + Send),
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    creds: &Credentials,
    cancel: &CancellationToken,
) -> Result<Report> {
    let windows: Vec<Option<BatchWindow>> = match (start, end) {
        (Some(start), Some(end)) => {
            if start.year() != end.year() {
                bail!(
                    "start day year {} should match end day year {}",
                    start.year(),
                    end.year()
                );
            }
            batch_windows(start, end, MAX_BATCH_DAYS)
                .into_iter()
                .map(Some)
                .collect()
        }
        // No dates: a single batch of the portal's default current window.
        (None, None) => vec![None],
        _ => bail!("daily retrieval needs both bounds or neither"),
    };

    portal.login(creds).await.context("failed login")?;
    portal
        .open_report(ReportKind::Daily)
        .await
        .context("failed to select daily usage")?;

    let mut full_report = Report::default();
    let mut first_batch = true;

    for window in windows {
        // An in-flight submission can't be aborted without leaving the
        // session in an indeterminate state, so cancellation is honored
        // between batches only.
        if cancel.is_cancelled() {
            bail!("daily retrieval cancelled");
        }

        match window {
            Some(window) => info!(
                "load {} - {}",
                window.start.format("%-m/%-d/%Y"),
                window.end.format("%-m/%-d/%Y")
            ),
            None => info!("load default window"),
        }

        let (batch_start, batch_end) = match window {
            Some(window) => (Some(window.start), Some(window.end)),
            None => (None, None),
        };
        let payload = portal
            .download_batch(batch_start, batch_end)
            .await
            .with_context(|| batch_context(batch_start))?;
        let batch = Report::parse(&payload).with_context(|| batch_context(batch_start))?;

        if first_batch {
            // Headers are taken from the first batch and assumed stable for
            // the rest of the retrieval.
            full_report.label_header = batch.label_header;
            full_report.value_header = batch.value_header;
            first_batch = false;
        }

        // The default window is assumed to sit inside the current year.
        let year = match window {
            Some(window) => window.start.year(),
            None => Local::now().year(),
        };
        for record in batch.records {
            let label = relabel_daily(&record.label, year)
                .with_context(|| batch_context(batch_start))?;
            full_report.records.push(Record {
                label,
                value: record.value,
            });
        }

        portal
            .return_to_report()
            .await
            .context("failed to return to daily")?;
    }

    Ok(full_report)
}

fn batch_context(start: Option<NaiveDate>) -> String {
    match start {
        Some(start) => format!("daily batch starting {start} failed"),
        None => "default daily batch failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::TestPortal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn creds() -> Credentials {
        Credentials {
            user: "user".to_string(),
            password: "pass".to_string(),
            account: "12345".to_string(),
        }
    }

    #[tokio::test]
    async fn test_daily_61_day_range_uses_three_batches() {
        let mut portal = TestPortal::new();
        let report = daily_report(
            &mut portal,
            Some(date(2023, 3, 1)),
            Some(date(2023, 5, 1)),
            &creds(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            portal.downloads,
            vec![
                (Some(date(2023, 3, 1)), Some(date(2023, 3, 31))),
                (Some(date(2023, 3, 31)), Some(date(2023, 4, 30))),
                (Some(date(2023, 4, 30)), Some(date(2023, 5, 1))),
            ]
        );
        // One synthesized record per day, concatenated in traversal order.
        assert_eq!(report.records.len(), 61);
        assert_eq!(report.records[0].label, "2023-03-01");
        assert_eq!(report.records[30].label, "2023-03-31");
        assert_eq!(report.records[60].label, "2023-04-30");
        assert_eq!(report.label_header, "Date");
        assert_eq!(report.value_header, "Consumption in GALLONS");
    }

    #[tokio::test]
    async fn test_daily_default_window() {
        let mut portal = TestPortal::new();
        let report = daily_report(
            &mut portal,
            None,
            None,
            &creds(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(portal.downloads, vec![(None, None)]);
        assert_eq!(report.records.len(), 15);
        // Labels are recombined with the current year.
        let year = Local::now().year();
        assert_eq!(report.records[0].label, format!("{year}-04-21"));
        assert_eq!(report.records[14].label, format!("{year}-05-05"));
    }

    #[tokio::test]
    async fn test_daily_year_mismatch_rejected() {
        let mut portal = TestPortal::new();
        let result = daily_report(
            &mut portal,
            Some(date(2022, 12, 1)),
            Some(date(2023, 1, 5)),
            &creds(),
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        // Rejected before any portal traffic.
        assert!(portal.downloads.is_empty());
    }

    #[tokio::test]
    async fn test_daily_batch_failure_aborts_retrieval() {
        let mut portal = TestPortal::new();
        portal.fail_at = Some(1);
        let result = daily_report(
            &mut portal,
            Some(date(2023, 3, 1)),
            Some(date(2023, 5, 1)),
            &creds(),
            &CancellationToken::new(),
        )
        .await;

        // The error names the failed batch and no partial report survives.
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("daily batch starting 2023-03-31"), "{err}");
        assert_eq!(portal.downloads.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_unparseable_batch_aborts_retrieval() {
        let mut portal = TestPortal::new();
        portal.batches.insert(
            Some(date(2023, 3, 1)),
            "<html>session expired</html>".to_string(),
        );
        let result = daily_report(
            &mut portal,
            Some(date(2023, 3, 1)),
            Some(date(2023, 3, 10)),
            &creds(),
            &CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_daily_cancelled_before_first_batch() {
        let mut portal = TestPortal::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = daily_report(
            &mut portal,
            Some(date(2023, 3, 1)),
            Some(date(2023, 5, 1)),
            &creds(),
            &cancel,
        )
        .await;

        assert!(result.is_err());
        assert!(portal.downloads.is_empty());
    }
}
