use crate::args::{Common, RetrieveArgs};
use crate::commands::month_range;
use crate::portal::Mode;
use crate::{retrieve, Result};
use anyhow::Context;
use tokio_util::sync::CancellationToken;

/// Downloads a month of hourly usage and prints it as tab-separated text.
pub async fn hourly(
    args: &RetrieveArgs,
    common: &Common,
    cancel: &CancellationToken,
) -> Result<()> {
    let (start, end) = month_range(args.month())?;
    let report = retrieve::download_hourly(
        start,
        end,
        &common.credentials(),
        &common.portal_config(),
        Mode::from_env(),
        cancel,
    )
    .await
    .context("failed to retrieve water usage")?;
    print!("{report}");
    Ok(())
}
