use crate::config::OutputFormat;
use crate::models::lighthouse::audit::AuditEntry;
use crate::models::lighthouse::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The subset of a Lighthouse result (LHR) document that lightavg reads.
///
/// Everything else in the document is ignored on deserialization; the raw
/// report is persisted separately, untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    #[serde(default)]
    pub requested_url: Option<String>,
    #[serde(default)]
    pub final_displayed_url: Option<String>,
    // Lighthouse < 10 only reports these two.
    #[serde(default)]
    pub main_document_url: Option<String>,
    #[serde(default)]
    pub final_url: Option<String>,
    #[serde(default)]
    pub audits: HashMap<String, AuditEntry>,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

impl AuditResult {
    pub fn new(resolved_url: &str) -> Self {
        Self {
            final_displayed_url: Some(resolved_url.to_string()),
            ..Default::default()
        }
    }

    /// Final URL after redirects, used to derive the aggregation domain.
    pub fn resolved_url(&self) -> Option<&str> {
        self.final_displayed_url
            .as_deref()
            .or(self.main_document_url.as_deref())
            .or(self.final_url.as_deref())
    }

    pub fn with_audit(mut self, name: &str, entry: AuditEntry) -> Self {
        self.audits.insert(name.to_string(), entry);
        self
    }

    pub fn category_scores(&self) -> BTreeMap<&str, Option<f64>> {
        self.categories
            .iter()
            .map(|(name, category)| (name.as_str(), category.score))
            .collect()
    }

    pub fn performance_score(&self) -> Option<f64> {
        self.categories.get("performance").and_then(|c| c.score)
    }
}

/// What one audit run hands back: the parsed result plus every rendered report.
#[derive(Debug, Clone)]
pub struct RunnerResult {
    pub lhr: AuditResult,
    pub reports: Vec<(OutputFormat, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lighthouse_result() {
        let json = r#"{
            "lighthouseVersion": "12.0.0",
            "requestedUrl": "https://a.test/",
            "finalDisplayedUrl": "https://a.test/home",
            "finalUrl": "https://a.test/home?redirected",
            "audits": {
                "speed-index": {
                    "id": "speed-index",
                    "score": 0.9,
                    "numericValue": 1200.5,
                    "numericUnit": "millisecond"
                },
                "viewport": { "id": "viewport", "score": 1 }
            },
            "categories": {
                "performance": { "title": "Performance", "score": 0.87 },
                "seo": { "title": "SEO", "score": null }
            }
        }"#;

        let result: AuditResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.resolved_url(), Some("https://a.test/home"));
        assert_eq!(result.requested_url.as_deref(), Some("https://a.test/"));

        let speed = &result.audits["speed-index"];
        assert_eq!(speed.numeric_value, Some(1200.5));
        assert_eq!(speed.unit(), "millisecond");
        assert_eq!(result.audits["viewport"].numeric_value, None);
        assert_eq!(result.audits["viewport"].unit(), "");

        assert_eq!(result.performance_score(), Some(0.87));
        assert_eq!(result.category_scores().get("seo"), Some(&None));
    }

    #[test]
    fn test_older_final_url_field() {
        let result: AuditResult =
            serde_json::from_str(r#"{ "finalUrl": "https://old.test/" }"#).unwrap();
        assert_eq!(result.resolved_url(), Some("https://old.test/"));
        assert!(result.audits.is_empty());
    }
}
