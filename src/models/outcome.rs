//! Calculation outcome model
//!
//! Normalized growth API results, keyed by measurement method.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MeasurementMethod;

/// Values extracted from `measurement_calculated_values`; absent fields stay `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatedValues {
    pub centile: Option<f64>,
    pub sds: Option<f64>,
    pub centile_band: Option<String>,
    pub age_error: Option<Value>,
    pub corrected_age: Option<Value>,
    pub clinical_advice: Option<String>,
}

/// Result of one remote calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationOutcome {
    Failure { error: String },
    Success(CalculatedValues),
}

impl CalculationOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        CalculationOutcome::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CalculationOutcome::Success(_))
    }

    pub fn values(&self) -> Option<&CalculatedValues> {
        match self {
            CalculationOutcome::Success(values) => Some(values),
            CalculationOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CalculationOutcome::Failure { error } => Some(error),
            CalculationOutcome::Success(_) => None,
        }
    }
}

/// Outcomes for one request, one entry per measurement method
pub type AggregatedResult = BTreeMap<MeasurementMethod, CalculationOutcome>;

/// Response envelope returned to the form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<AggregatedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CentileResponse {
    pub fn completed(results: AggregatedResult) -> Self {
        Self {
            success: true,
            results: Some(results),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            error: Some(error.into()),
        }
    }
}
