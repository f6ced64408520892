use crate::models::{AggregateStats, AuditResult, DomainMetricSummary};
use crate::utils::extract_domain;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Unit whose values are kept to three decimals; everything else is rounded to integers.
pub const UNITLESS: &str = "unitless";

/// How `avg` and `score` are folded across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AveragingMode {
    /// `(previous + value) / 2` on every contribution. Order dependent.
    #[default]
    Running,
    /// True arithmetic mean.
    Mean,
}

pub fn decimals_for_unit(unit: &str) -> i32 {
    if unit == UNITLESS {
        3
    } else {
        0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// Running state for one (domain, metric) cell.
#[derive(Debug, Default)]
struct MetricAccumulator {
    min: Option<f64>,
    max: Option<f64>,
    avg: Option<f64>,
    unit: String,
    score: Option<f64>,
    sum: f64,
    count: u32,
    score_sum: f64,
    score_count: u32,
}

impl MetricAccumulator {
    fn push(&mut self, value: f64, unit: &str, score: Option<f64>, mode: AveragingMode) {
        self.unit = unit.to_string();
        let decimals = decimals_for_unit(unit);

        let min = self.min.map_or(value, |m| m.min(value));
        let max = self.max.map_or(value, |m| m.max(value));
        self.min = Some(round_to(min, decimals));
        self.max = Some(round_to(max, decimals));

        self.sum += value;
        self.count += 1;
        let avg = match mode {
            AveragingMode::Running => self.avg.map_or(value, |prev| (prev + value) / 2.0),
            AveragingMode::Mean => self.sum / self.count as f64,
        };
        self.avg = Some(round_to(avg, decimals));

        if let Some(score) = score {
            self.score_sum += score;
            self.score_count += 1;
            self.score = Some(match mode {
                AveragingMode::Running => self.score.map_or(score, |prev| (prev + score) / 2.0),
                AveragingMode::Mean => self.score_sum / self.score_count as f64,
            });
        }
    }

    fn finish(self) -> DomainMetricSummary {
        // push() always sets min/max/avg together; a cell only exists after one push.
        DomainMetricSummary {
            min: self.min.unwrap_or_default(),
            max: self.max.unwrap_or_default(),
            avg: self.avg.unwrap_or_default(),
            unit: self.unit,
            score: self.score,
        }
    }
}

/// Aggregates per-page results into per-domain metric summaries using the
/// running pairwise average.
pub fn aggregate(results: &[AuditResult], metrics: &[String]) -> AggregateStats {
    aggregate_with(results, metrics, AveragingMode::Running)
}

pub fn aggregate_with(
    results: &[AuditResult],
    metrics: &[String],
    mode: AveragingMode,
) -> AggregateStats {
    let mut cells: BTreeMap<String, HashMap<&str, MetricAccumulator>> = BTreeMap::new();

    for result in results {
        let Some(domain) = result.resolved_url().and_then(extract_domain) else {
            continue;
        };

        for metric in metrics {
            let Some(entry) = result.audits.get(metric) else {
                continue;
            };
            let Some(value) = entry.numeric_value else {
                continue;
            };

            cells
                .entry(domain.to_string())
                .or_default()
                .entry(metric.as_str())
                .or_default()
                .push(value, entry.unit(), entry.score, mode);
        }
    }

    cells
        .into_iter()
        .map(|(domain, metrics)| {
            let summaries = metrics
                .into_iter()
                .map(|(metric, acc)| (metric.to_string(), acc.finish()))
                .collect();
            (domain, summaries)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditEntry;

    fn page(url: &str, metric: &str, value: f64, unit: &str, score: Option<f64>) -> AuditResult {
        AuditResult::new(url).with_audit(metric, AuditEntry::new(value, unit, score))
    }

    fn metrics(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_results() {
        assert!(aggregate(&[], &metrics(&["speed-index"])).is_empty());
    }

    #[test]
    fn test_two_pages_same_domain() {
        let results = vec![
            page("https://a.test/", "speed-index", 1200.0, "millisecond", Some(0.9)),
            page("https://a.test/about", "speed-index", 1800.0, "millisecond", Some(0.6)),
        ];

        let stats = aggregate(&results, &metrics(&["speed-index"]));

        assert_eq!(stats.len(), 1);
        assert_eq!(
            stats["a.test"]["speed-index"],
            DomainMetricSummary {
                min: 1200.0,
                max: 1800.0,
                avg: 1500.0,
                unit: "millisecond".to_string(),
                score: Some(0.75),
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let results = vec![page("https://a.test/", "speed-index", 1200.0, "millisecond", Some(0.9))];
        let json = serde_json::to_value(aggregate(&results, &metrics(&["speed-index"]))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "a.test": {
                    "speed-index": {
                        "min": 1200.0, "max": 1200.0, "avg": 1200.0,
                        "unit": "millisecond", "score": 0.9
                    }
                }
            })
        );
    }

    #[test]
    fn test_missing_resolved_url_is_skipped() {
        let result = AuditResult::default()
            .with_audit("speed-index", AuditEntry::new(1000.0, "millisecond", Some(1.0)));
        assert!(aggregate(&[result], &metrics(&["speed-index"])).is_empty());
    }

    #[test]
    fn test_min_max_are_exact() {
        let values = [3400.0, 900.0, 5100.0, 2200.0, 900.0];
        let results: Vec<_> = values
            .iter()
            .map(|v| page("https://a.test/", "interactive", *v, "millisecond", None))
            .collect();

        let summary = &aggregate(&results, &metrics(&["interactive"]))["a.test"]["interactive"];
        assert_eq!(summary.min, 900.0);
        assert_eq!(summary.max, 5100.0);
        assert_eq!(summary.score, None);
    }

    #[test]
    fn test_single_value_average() {
        let results = vec![page("https://a.test/", "interactive", 2345.0, "millisecond", Some(0.5))];
        let summary = &aggregate(&results, &metrics(&["interactive"]))["a.test"]["interactive"];
        assert_eq!(summary.avg, 2345.0);
        assert_eq!(summary.score, Some(0.5));
    }

    #[test]
    fn test_running_average_is_order_dependent() {
        let run = |values: &[f64]| {
            let results: Vec<_> = values
                .iter()
                .map(|v| page("https://a.test/", "speed-index", *v, "millisecond", None))
                .collect();
            aggregate(&results, &metrics(&["speed-index"]))["a.test"]["speed-index"].avg
        };

        // round((round((1000 + 2000) / 2) + 4001) / 2) = round(2750.5) = 2751
        assert_eq!(run(&[1000.0, 2000.0, 4001.0]), 2751.0);
        // round((round((4001 + 2000) / 2) + 1000) / 2) = round((3001 + 1000) / 2) = 2001
        assert_eq!(run(&[4001.0, 2000.0, 1000.0]), 2001.0);
    }

    #[test]
    fn test_mean_mode() {
        let results: Vec<_> = [1000.0, 2000.0, 4001.0]
            .iter()
            .zip([0.2, 0.4, 0.9])
            .map(|(v, s)| page("https://a.test/", "speed-index", *v, "millisecond", Some(s)))
            .collect();

        let stats = aggregate_with(&results, &metrics(&["speed-index"]), AveragingMode::Mean);
        let summary = &stats["a.test"]["speed-index"];
        assert_eq!(summary.avg, 2334.0);
        assert!((summary.score.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unitless_rounds_to_three_decimals() {
        let results = vec![
            page("https://a.test/", "cumulative-layout-shift", 0.123456, "unitless", Some(1.0)),
            page("https://a.test/x", "cumulative-layout-shift", 0.123456, "unitless", Some(1.0)),
        ];

        let summary = &aggregate(&results, &metrics(&["cumulative-layout-shift"]))["a.test"]
            ["cumulative-layout-shift"];
        assert_eq!(summary.min, 0.123);
        assert_eq!(summary.max, 0.123);
        assert_eq!(summary.avg, 0.123);
        assert_eq!(summary.unit, "unitless");
    }

    #[test]
    fn test_other_units_round_to_integers() {
        let results = vec![page("https://a.test/", "total-byte-weight", 1234.6, "byte", None)];
        let summary = &aggregate(&results, &metrics(&["total-byte-weight"]))["a.test"]
            ["total-byte-weight"];
        assert_eq!(summary.min, 1235.0);
        assert_eq!(summary.avg, 1235.0);
    }

    #[test]
    fn test_zero_value_contributes() {
        let results = vec![
            page("https://a.test/", "cumulative-layout-shift", 0.0, "unitless", Some(1.0)),
            page("https://a.test/x", "cumulative-layout-shift", 0.2, "unitless", Some(0.8)),
        ];

        let summary = &aggregate(&results, &metrics(&["cumulative-layout-shift"]))["a.test"]
            ["cumulative-layout-shift"];
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.avg, 0.1);
    }

    #[test]
    fn test_metric_not_in_allow_list_is_ignored() {
        let results = vec![page("https://a.test/", "interactive", 2000.0, "millisecond", None)
            .with_audit("speed-index", AuditEntry::new(1500.0, "millisecond", None))];

        let stats = aggregate(&results, &metrics(&["speed-index"]));
        assert!(stats["a.test"].contains_key("speed-index"));
        assert!(!stats["a.test"].contains_key("interactive"));
    }

    #[test]
    fn test_domain_without_numeric_metrics_is_absent() {
        let mut no_value = AuditResult::new("https://b.test/");
        no_value.audits.insert(
            "speed-index".to_string(),
            AuditEntry {
                score: Some(1.0),
                numeric_value: None,
                numeric_unit: None,
            },
        );
        let results = vec![
            no_value,
            page("https://a.test/", "speed-index", 1000.0, "millisecond", None),
        ];

        let stats = aggregate(&results, &metrics(&["speed-index", "interactive"]));
        assert_eq!(stats.keys().collect::<Vec<_>>(), vec!["a.test"]);
        assert!(!stats["a.test"].contains_key("interactive"));
    }

    #[test]
    fn test_port_is_part_of_the_domain() {
        let results = vec![
            page("https://example.com/page", "speed-index", 1000.0, "millisecond", None),
            page("https://example.com:443/other", "speed-index", 3000.0, "millisecond", None),
        ];

        let stats = aggregate(&results, &metrics(&["speed-index"]));
        assert_eq!(stats["example.com"]["speed-index"].avg, 1000.0);
        assert_eq!(stats["example.com:443"]["speed-index"].avg, 3000.0);
    }

    #[test]
    fn test_last_seen_unit_wins() {
        let results = vec![
            page("https://a.test/", "server-response-time", 120.0, "millisecond", None),
            page("https://a.test/x", "server-response-time", 0.5, "second", None),
        ];

        let summary = &aggregate(&results, &metrics(&["server-response-time"]))["a.test"]
            ["server-response-time"];
        assert_eq!(summary.unit, "second");
        assert_eq!(summary.min, 1.0);
    }

    #[test]
    fn test_missing_score_does_not_reset_average() {
        let results = vec![
            page("https://a.test/", "speed-index", 1000.0, "millisecond", Some(0.8)),
            page("https://a.test/x", "speed-index", 1000.0, "millisecond", None),
            page("https://a.test/y", "speed-index", 1000.0, "millisecond", Some(0.4)),
        ];

        let summary = &aggregate(&results, &metrics(&["speed-index"]))["a.test"]["speed-index"];
        assert!((summary.score.unwrap() - 0.6).abs() < 1e-9);
    }
}
