//! Threshold analysis of the most recent readings in a usage report.

use crate::alert::Alerter;
use crate::model::Report;
use crate::Result;
use anyhow::{bail, Context};

/// Checks the tail of `report` against the usage limits and alerts through
/// `alerter` when either is exceeded.
///
/// Only the last two records are read, with integer-truncated values: one
/// alert when the last day's usage reaches `one_day_max`, and an independent
/// one when the two-day average reaches `two_day_avg_max`. Both checks run
/// regardless of whether the other fired, but a delivery failure propagates
/// immediately. A report with fewer than three records is rejected; a
/// two-day average needs more history than that to mean anything.
pub async fn analyze_usage(
    report: &Report,
    two_day_avg_max: i64,
    one_day_max: i64,
    alerter: &dyn Alerter,
) -> Result<()> {
    let num_records = report.records.len();
    if num_records < 3 {
        bail!("too few records parsed from usage: {num_records}");
    }

    let last_usage = report.records[num_records - 1].value as i64;
    if last_usage >= one_day_max {
        alerter
            .alert(&format!(
                "Last day water usage of {last_usage} gallons is greater than {one_day_max} gallon limit.\n{report}"
            ))
            .await
            .context("failed to alert")?;
    }

    let penultimate_usage = report.records[num_records - 2].value as i64;
    let two_day_avg = (penultimate_usage + last_usage) / 2;
    if two_day_avg >= two_day_avg_max {
        alerter
            .alert(&format!(
                "Two day avg water usage of {two_day_avg} gallons is greater than {two_day_avg_max} gallon limit.\n{report}"
            ))
            .await
            .context("failed to alert")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::Mutex;

    const TEST_INPUT: &str = "Date\tConsumption in GALLONS\n\
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

    #[derive(Default)]
    struct MockAlerter {
        messages: Mutex<Vec<String>>,
    }

    impl MockAlerter {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Alerter for MockAlerter {
        async fn alert(&self, msg: &str) -> crate::Result<()> {
            self.messages.lock().unwrap().push(msg.to_string());
            Ok(())
        }
    }

    /// Fails every delivery, counting the attempts.
    #[derive(Default)]
    struct BrokenAlerter {
        attempts: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl Alerter for BrokenAlerter {
        async fn alert(&self, _msg: &str) -> crate::Result<()> {
            *self.attempts.lock().unwrap() += 1;
            bail!("sink unavailable");
        }
    }

    #[tokio::test]
    async fn test_analyze() {
        struct Case {
            name: &'static str,
            two_day_avg_max: i64,
            one_day_max: i64,
            expect_msg: Option<&'static str>,
        }
        let cases = [
            Case {
                name: "no alert",
                two_day_avg_max: 3000,
                one_day_max: 3000,
                expect_msg: None,
            },
            Case {
                name: "two day alert",
                two_day_avg_max: 1600,
                one_day_max: 3000,
                expect_msg: Some(
                    "Two day avg water usage of 1682 gallons is greater than 1600 gallon limit.",
                ),
            },
            Case {
                name: "one day alert",
                two_day_avg_max: 3000,
                one_day_max: 1500,
                expect_msg: Some(
                    "Last day water usage of 1570 gallons is greater than 1500 gallon limit.",
                ),
            },
        ];

        for case in cases {
            let report = Report::parse(TEST_INPUT).unwrap();
            let alerter = MockAlerter::default();
            analyze_usage(&report, case.two_day_avg_max, case.one_day_max, &alerter)
                .await
                .unwrap();

            let messages = alerter.messages();
            match case.expect_msg {
                None => assert!(messages.is_empty(), "unexpected alert for {}", case.name),
                Some(prefix) => {
                    assert_eq!(messages.len(), 1, "expected one alert for {}", case.name);
                    assert!(
                        messages[0].starts_with(prefix),
                        "expected {prefix} but was {} for {}",
                        messages[0],
                        case.name
                    );
                    // The payload carries the full report for context.
                    assert!(messages[0].contains("4/21\t1944.000000"));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_analyze_both_alerts_fire() {
        let report = Report::parse(TEST_INPUT).unwrap();
        let alerter = MockAlerter::default();
        analyze_usage(&report, 1600, 1500, &alerter).await.unwrap();
        let messages = alerter.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Last day water usage"));
        assert!(messages[1].starts_with("Two day avg water usage"));
    }

    #[tokio::test]
    async fn test_analyze_too_few_records() {
        let report =
            Report::parse("Date\tConsumption in GALLONS\n5/04\t1795\n5/05\t1570\n").unwrap();
        let alerter = MockAlerter::default();
        let result = analyze_usage(&report, 3000, 3000, &alerter).await;
        assert!(result.is_err());
        assert!(alerter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_delivery_failure_short_circuits() {
        let report = Report::parse(TEST_INPUT).unwrap();
        let alerter = BrokenAlerter::default();
        // Both thresholds are exceeded, but the first failed delivery must
        // end the analysis.
        let result = analyze_usage(&report, 1600, 1500, &alerter).await;
        assert!(result.is_err());
        assert_eq!(*alerter.attempts.lock().unwrap(), 1);
    }
}
