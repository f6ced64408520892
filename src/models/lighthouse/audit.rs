use serde::{Deserialize, Serialize};

// pub struct for individual audit results
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub numeric_unit: Option<String>,
}

impl AuditEntry {
    pub fn new(numeric_value: f64, numeric_unit: &str, score: Option<f64>) -> Self {
        Self {
            score,
            numeric_value: Some(numeric_value),
            numeric_unit: Some(numeric_unit.to_string()),
        }
    }

    /// Unit label, empty when Lighthouse did not report one.
    pub fn unit(&self) -> &str {
        self.numeric_unit.as_deref().unwrap_or_default()
    }
}
