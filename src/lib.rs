mod alert;
mod analyze;
pub mod args;
pub mod commands;
mod error;
mod model;
mod portal;
mod retrieve;

pub use alert::{Alerter, LogAlerter, WebhookAlerter};
pub use analyze::analyze_usage;
pub use error::Error;
pub use error::Result;
pub use model::{Record, Report};
pub use portal::{Credentials, Mode, PortalConfig, PortalSession};
pub use retrieve::{download_daily, download_hourly};
