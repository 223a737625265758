//! Implements the `Portal` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so
//! that we can run the whole app, top-to-bottom, without touching the real
//! portal (see `Mode`).

use crate::portal::{Credentials, Portal, ReportKind};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::HashMap;

/// An implementation of the `Portal` trait that serves canned exports from
/// memory. Tests can seed specific batches; anything not seeded gets a
/// synthetic export derived from the requested dates.
pub(crate) struct TestPortal {
    /// Canned payloads keyed by the batch's start date (`None` for the
    /// no-dates convenience batch).
    pub(crate) batches: HashMap<Option<NaiveDate>, String>,
    /// Every `download_batch` call, recorded for assertions.
    pub(crate) downloads: Vec<(Option<NaiveDate>, Option<NaiveDate>)>,
    /// When set, the nth (0-based) download fails.
    pub(crate) fail_at: Option<usize>,
    logged_in: bool,
    report: Option<ReportKind>,
    returns: usize,
}

impl TestPortal {
    pub(crate) fn new() -> Self {
        let mut batches = HashMap::new();
        batches.insert(None, DEFAULT_WINDOW_DATA.to_string());
        Self {
            batches,
            downloads: Vec::new(),
            fail_at: None,
            logged_in: false,
            report: None,
            returns: 0,
        }
    }

    /// Produces an export for a batch nothing was seeded for: one row per
    /// day for daily reports, one row per hour of the single day for hourly
    /// reports.
    fn synthesize(
        kind: ReportKind,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> String {
        let mut out = String::from("Date\tConsumption in GALLONS\n");
        match kind {
            ReportKind::Daily => {
                let mut date = start;
                let end = end.unwrap_or_else(|| start + Days::new(1));
                while date < end {
                    out.push_str(&format!(
                        "{}/{}\t{}\n",
                        date.month(),
                        date.day(),
                        1000 + date.day()
                    ));
                    date = date + Days::new(1);
                }
            }
            ReportKind::Hourly => {
                for hour in 0..24u32 {
                    let meridiem = if hour < 12 { "AM" } else { "PM" };
                    let clock = match hour % 12 {
                        0 => 12,
                        h => h,
                    };
                    out.push_str(&format!("{clock} {meridiem}\t{}\n", hour * 10));
                }
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl Portal for TestPortal {
    async fn login(&mut self, creds: &Credentials) -> Result<()> {
        if creds.user.is_empty() || creds.password.is_empty() {
            bail!("missing credentials");
        }
        self.logged_in = true;
        Ok(())
    }

    async fn open_report(&mut self, kind: ReportKind) -> Result<()> {
        if !self.logged_in {
            bail!("not logged in");
        }
        self.report = Some(kind);
        Ok(())
    }

    async fn download_batch(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<String> {
        let kind = self.report.context("no report selected")?;
        // The real portal's form targets are only valid from the report
        // page; enforce the same discipline here.
        if self.returns != self.downloads.len() {
            bail!("form submitted from a stale page");
        }
        if self.fail_at == Some(self.downloads.len()) {
            bail!("synthetic download failure");
        }
        self.downloads.push((start, end));
        if let Some(batch) = self.batches.get(&start) {
            return Ok(batch.clone());
        }
        let start = start.context("no data seeded for the no-dates batch")?;
        Ok(Self::synthesize(kind, start, end))
    }

    async fn return_to_report(&mut self) -> Result<()> {
        if self.report.is_none() {
            bail!("no report page to return to");
        }
        self.returns += 1;
        Ok(())
    }
}

/// Seed data for the no-dates "most recent" batch: two weeks of daily usage.
const DEFAULT_WINDOW_DATA: &str = "Date\tConsumption in GALLONS\n\
4/21\t1944\n\
4/22\t1944\n\
4/23\t2169\n\
4/24\t2169\n\
4/25\t1496\n\
4/26\t1421\n\
4/27\t1496\n\
4/28\t1720\n\
4/29\t2468\n\
4/30\t2244\n\
5/01\t1645\n\
5/02\t1570\n\
5/03\t1645\n\
5/04\t1795\n\
5/05\t1570\n";
