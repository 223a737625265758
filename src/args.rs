//! These structs provide the CLI interface for the water CLI.

use crate::portal::{Credentials, PortalConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// water: monitor water usage reported by the utility's account portal.
///
/// The program logs into the portal with your account credentials, downloads
/// daily or hourly consumption exports, and can check recent usage against
/// limits, alerting when they are exceeded. Credentials are taken from the
/// WATER_USER, WATER_PASS and WATER_ACCT environment variables or the
/// corresponding flags.
///
/// Be patient: the portal only hands out data in small batches and we pause
/// between requests so it doesn't mistake us for an attack.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download daily usage for a month and print it as tab-separated text.
    Daily(RetrieveArgs),
    /// Download hourly usage for a month and print it as tab-separated text.
    ///
    /// Hourly data is exported one day at a time, so a whole month takes a
    /// while.
    Hourly(RetrieveArgs),
    /// Check recent daily usage against limits and alert when exceeded.
    ///
    /// Uses the portal's default "most recent" window, so no dates are
    /// needed. Intended to be run once a day from a scheduler.
    Monitor(MonitorArgs),
    /// Group a saved hourly report into 4-hour periods per day.
    Summarize(SummarizeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// Portal login user id.
    #[arg(long, env = "WATER_USER", hide_env_values = true, default_value = "")]
    user: String,

    /// Portal login password.
    #[arg(long, env = "WATER_PASS", hide_env_values = true, default_value = "")]
    pass: String,

    /// The account identifier to select after login.
    #[arg(long, env = "WATER_ACCT", default_value = "")]
    acct: String,

    /// Seconds to wait before each batch download. The portal throttles
    /// aggressive clients; lowering this is not recommended.
    #[arg(long, default_value_t = 3)]
    batch_delay: u64,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.user.clone(),
            password: self.pass.clone(),
            account: self.acct.clone(),
        }
    }

    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            batch_delay: Duration::from_secs(self.batch_delay),
            ..PortalConfig::default()
        }
    }
}

/// Args shared by the `daily` and `hourly` download commands.
#[derive(Debug, Parser, Clone)]
pub struct RetrieveArgs {
    /// The month to download, as YYYYMM. A range that extends past today is
    /// clamped to today.
    month: String,
}

impl RetrieveArgs {
    pub fn month(&self) -> &str {
        &self.month
    }
}

/// Args for the `monitor` command.
#[derive(Debug, Parser, Clone)]
pub struct MonitorArgs {
    /// Alert when the average usage of the last two days reaches this many
    /// gallons.
    #[arg(long, default_value_t = 1500)]
    two_day_avg_limit: i64,

    /// Alert when the last day's usage reaches this many gallons.
    #[arg(long, default_value_t = 2000)]
    one_day_limit: i64,

    /// Deliver alerts as JSON to this webhook URL instead of the log.
    #[arg(long, env = "WATER_ALERT_WEBHOOK")]
    webhook_url: Option<Url>,
}

impl MonitorArgs {
    pub fn two_day_avg_limit(&self) -> i64 {
        self.two_day_avg_limit
    }

    pub fn one_day_limit(&self) -> i64 {
        self.one_day_limit
    }

    pub fn webhook_url(&self) -> Option<&Url> {
        self.webhook_url.as_ref()
    }
}

/// Args for the `summarize` command.
#[derive(Debug, Parser, Clone)]
pub struct SummarizeArgs {
    /// A report file of hourly records, as produced by `water hourly`.
    data_file: PathBuf,
}

impl SummarizeArgs {
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}
