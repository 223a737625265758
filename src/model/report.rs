use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A water usage report: time-labeled readings in chronological order plus
/// the column headers from the portal's export.
///
/// A report is built up batch-by-batch during retrieval and handed to the
/// caller as an immutable whole; the headers come from the first batch of the
/// retrieval.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Report {
    /// The export's name for the label column, e.g. `Date`.
    pub label_header: String,
    /// The export's name for the value column, e.g. `Consumption in GALLONS`.
    pub value_header: String,
    pub records: Vec<Record>,
}

/// One usage observation. The label is a `YYYY-MM-DD` date for daily data or
/// a `YYYY-MM-DD HH:MM` timestamp for hourly data; the value is gallons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    pub label: String,
    pub value: f64,
}

impl Report {
    /// Parses a tab-separated usage export.
    ///
    /// The first row must be the two column headers and every following row a
    /// label and a numeric value. Fails, with no partial result, if the input
    /// has fewer than two rows, a row does not have exactly two fields, or a
    /// value is not numeric.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(raw.as_bytes());

        let mut rows: Vec<(String, String)> = Vec::new();
        for row in reader.records() {
            let row = row.context("failed to parse usage data")?;
            if row.len() != 2 {
                bail!("expected 2 fields in usage data row, found {}", row.len());
            }
            rows.push((row[0].to_string(), row[1].to_string()));
        }

        if rows.len() < 2 {
            bail!("too few records parsed from usage: {}", rows.len());
        }

        let mut rows = rows.into_iter();
        let (label_header, value_header) = match rows.next() {
            Some(headers) => headers,
            None => bail!("usage data is missing a header row"),
        };

        let mut records = Vec::new();
        for (label, value) in rows {
            let value: f64 = value
                .parse()
                .with_context(|| format!("failed to parse {label} - {value}"))?;
            records.push(Record { label, value });
        }

        Ok(Self {
            label_header,
            value_header,
            records,
        })
    }
}

impl Display for Report {
    /// Renders the report back into tab-separated text: the header row, then
    /// one `label\tvalue` row per record with a fixed-precision value.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}\t{}", self.label_header, self.value_header)?;
        for record in &self.records {
            writeln!(f, "{}\t{:.6}", record.label, record.value)?;
        }
        Ok(())
    }
}
