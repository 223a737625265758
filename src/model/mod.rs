//! Types that represent the core data model: the usage `Report` and its
//! `Record` rows.
mod report;

pub use report::{Record, Report};
