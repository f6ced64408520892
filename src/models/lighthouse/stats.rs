use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-page summary of one metric on one domain.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DomainMetricSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub unit: String,
    /// `None` when no contributing page reported a score.
    pub score: Option<f64>,
}

pub type MetricStats = BTreeMap<String, DomainMetricSummary>;

/// domain -> metric name -> summary
pub type AggregateStats = BTreeMap<String, MetricStats>;
