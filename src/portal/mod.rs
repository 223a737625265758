//! Automation of the utility's account portal: an authenticated, stateful
//! browsing session scoped to one retrieval.
//!
//! The `Portal` trait is the seam between the retrieval orchestrators and
//! the live site. `PortalSession` implements it against the real portal;
//! `TestPortal` implements it with in-memory data.

pub(crate) mod form;
pub(crate) mod markup;
mod session;
mod test_client;
mod tls;

use crate::Result;
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub use session::PortalSession;
pub(crate) use test_client::TestPortal;

/// Login credentials plus the account identifier selected after login. All
/// three are opaque strings used verbatim in form fields.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub account: String,
}

/// Which usage report menu to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Daily,
    Hourly,
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Daily => write!(f, "daily"),
            ReportKind::Hourly => write!(f, "hourly"),
        }
    }
}

/// Portal tunables. The inter-batch delay is deliberate backpressure to stay
/// clear of the portal's abuse protections, not a performance knob.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub batch_delay: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: markup::PORTAL_URL.to_string(),
            batch_delay: Duration::from_secs(3),
        }
    }
}

/// Selects the live portal or the in-memory test portal. When
/// `WATER_IN_TEST_MODE` is set and non-empty the test portal is used, which
/// allows running the whole app top-to-bottom without touching the real
/// site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Live,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var("WATER_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Live,
        }
    }
}

/// Primitive operations of one authenticated portal session.
///
/// Batches must be issued strictly in order: every submission invalidates
/// the page the form came from, so `return_to_report` is required before the
/// next `download_batch`.
#[async_trait::async_trait]
pub(crate) trait Portal {
    /// Two-stage login: submit user id and password, then select the account
    /// on the follow-up form. Failure at either stage is terminal and is not
    /// retried here.
    async fn login(&mut self, creds: &Credentials) -> Result<()>;

    /// Navigates from the post-login page to the report page for `kind` and
    /// remembers it as the page to come back to between batches.
    async fn open_report(&mut self, kind: ReportKind) -> Result<()>;

    /// Populates and submits the export form, capturing the tab-separated
    /// payload as text rather than following it as a navigation.
    ///
    /// `end` is exclusive; the portal wants an inclusive end date, so it is
    /// sent as `end - 1 day`. With no dates at all the portal returns its
    /// default current window.
    async fn download_batch(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<String>;

    /// Re-opens the report page; the form targets are only valid from there.
    async fn return_to_report(&mut self) -> Result<()>;
}

/// Creates a portal driver for `mode`.
pub(crate) async fn connect(config: &PortalConfig, mode: Mode) -> Result<Box<dyn Portal + Send>> {
    match mode {
        Mode::Live => Ok(Box::new(PortalSession::connect(config.clone()).await?)),
        Mode::Test => Ok(Box::new(TestPortal::new())),
    }
}
