//! Daily job to check recent water usage and alert if it exceeds normal
//! levels.

use crate::alert::{Alerter, LogAlerter, WebhookAlerter};
use crate::args::{Common, MonitorArgs};
use crate::portal::Mode;
use crate::{analyze_usage, retrieve, Result};
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Retrieves the portal's default daily window and checks the most recent
/// readings against the limits.
///
/// Retrieval and analysis failures are themselves alerted, best effort,
/// before being returned; a scheduler running this unattended should not
/// fail silently.
pub async fn monitor(
    args: &MonitorArgs,
    common: &Common,
    cancel: &CancellationToken,
) -> Result<()> {
    let alerter = alerter(args);

    let retrieval = retrieve::download_daily(
        None,
        None,
        &common.credentials(),
        &common.portal_config(),
        Mode::from_env(),
        cancel,
    )
    .await;
    let report = match retrieval {
        Ok(report) => report,
        Err(e) => {
            if let Err(alert_err) = alerter
                .alert(&format!("Failed to retrieve water usage: {e:#}"))
                .await
            {
                return Err(alert_err).with_context(|| format!("failed to alert about: {e:#}"));
            }
            return Err(e).context("failed to retrieve water usage");
        }
    };

    info!("usage data:\n{report}");

    let analysis = analyze_usage(
        &report,
        args.two_day_avg_limit(),
        args.one_day_limit(),
        alerter.as_ref(),
    )
    .await;
    if let Err(e) = analysis {
        if let Err(alert_err) = alerter
            .alert(&format!("Failed to analyze water usage: {e:#}"))
            .await
        {
            return Err(alert_err).with_context(|| format!("failed to alert about: {e:#}"));
        }
        return Err(e).context("failed to analyze water usage");
    }

    Ok(())
}

fn alerter(args: &MonitorArgs) -> Box<dyn Alerter + Send + Sync> {
    match args.webhook_url() {
        Some(url) => Box::new(WebhookAlerter::new(url.clone())),
        None => Box::new(LogAlerter),
    }
}
