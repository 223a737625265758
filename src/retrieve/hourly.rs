use crate::model::{Record, Report};
use crate::portal::{self, Credentials, Mode, Portal, PortalConfig, ReportKind};
use crate::retrieve::{batch_windows, relabel_hourly};
use crate::Result;
use anyhow::{bail, Context};
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Downloads a report of hourly water usage for `[start, end)`.
///
/// The portal only exports hourly data one day at a time, so each day in the
/// range is its own batch.
pub async fn download_hourly(
    start: NaiveDate,
    end: NaiveDate,
    creds: &Credentials,
    config: &PortalConfig,
    mode: Mode,
    cancel: &CancellationToken,
) -> Result<Report> {
    let mut portal = portal::connect(config, mode).await?;
    hourly_report(portal.as_mut(), start, end, creds, cancel).await
}

/// Drives `portal` through an hourly retrieval: one login, one menu
/// selection, then one single-day export per day, merged in traversal order.
pub(crate) async fn hourly_report(
    portal: &mut (dyn Portal + Send),
    start: NaiveDate,
    end: NaiveDate,
    creds: &Credentials,
    cancel: &CancellationToken,
) -> Result<Report> {
    portal.login(creds).await.context("failed login")?;
    portal
        .open_report(ReportKind::Hourly)
        .await
        .context("failed to select hourly usage")?;

    let mut full_report = Report::default();
    let mut first_batch = true;

    for window in batch_windows(start, end, 1) {
        // Cancellation is honored between batches only; see `daily_report`.
        if cancel.is_cancelled() {
            bail!("hourly retrieval cancelled");
        }

        let date = window.start;
        info!("load {}", date.format("%-m/%-d/%Y"));

        let payload = portal
            .download_batch(Some(date), None)
            .await
            .with_context(|| format!("hourly batch for {date} failed"))?;
        let batch = Report::parse(&payload)
            .with_context(|| format!("hourly batch for {date} failed"))?;

        if first_batch {
            full_report.label_header = batch.label_header;
            full_report.value_header = batch.value_header;
            first_batch = false;
        }

        for record in batch.records {
            let label = relabel_hourly(&record.label, date)
                .with_context(|| format!("hourly batch for {date} failed"))?;
            full_report.records.push(Record {
                label,
                value: record.value,
            });
        }

        portal
            .return_to_report()
            .await
            .context("failed to return to hourly")?;
    }

    Ok(full_report)
}
