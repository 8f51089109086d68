//! Growth API client
//!
//! One blocking POST per measurement record. Every failure is folded into a
//! `CalculationOutcome::Failure` so one bad measurement never sinks its siblings.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::build_info::BuildInfo;
use crate::models::{CalculatedValues, CalculationOutcome, MeasurementRecord};

use super::error::RemoteError;

/// Fixed timeout for one remote calculation
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Calculates centiles for a single measurement
pub trait CalculationClient: Send + Sync {
    fn calculate(&self, record: &MeasurementRecord, api_key: Option<&str>) -> CalculationOutcome;
}

impl From<RemoteError> for CalculationOutcome {
    fn from(err: RemoteError) -> Self {
        CalculationOutcome::failure(err.to_string())
    }
}

/// Client for the RCPCH growth API calculation endpoint
#[derive(Debug, Clone)]
pub struct HttpCalculationClient {
    endpoint: String,
    timeout: Duration,
}

impl HttpCalculationClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    fn send(&self, record: &MeasurementRecord, api_key: Option<&str>) -> Result<(StatusCode, String), RemoteError> {
        // Built per call: no pooled connections outlive a calculation
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(BuildInfo::current().user_agent())
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let mut request = client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(record);

        if let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok((status, body))
    }
}

impl CalculationClient for HttpCalculationClient {
    fn calculate(&self, record: &MeasurementRecord, api_key: Option<&str>) -> CalculationOutcome {
        let method = record.measurement_method.as_str();

        match self.send(record, api_key) {
            Ok((status, body)) => {
                let outcome = classify_response(status, &body);
                if let Some(error) = outcome.error() {
                    tracing::warn!("Growth API rejected {} calculation ({}): {}", method, status, error);
                }
                outcome
            }
            Err(err) => {
                tracing::warn!("Growth API call for {} failed: {}", method, err);
                err.into()
            }
        }
    }
}

/// Classify a growth API response into an outcome
pub fn classify_response(status: StatusCode, body: &str) -> CalculationOutcome {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if status == StatusCode::OK {
        if parsed.is_none() {
            tracing::warn!("Growth API returned a non-JSON success body; treating all values as absent");
        }
        return CalculationOutcome::Success(extract_values(parsed.as_ref().unwrap_or(&Value::Null)));
    }

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("detail"))
        .and_then(detail_message)
        .unwrap_or_else(|| format!("API error: HTTP {}", status.as_u16()));

    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
    .into()
}

/// Validation failures carry `detail` as a list of objects rather than a string
fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Pull the calculated values out of a success body; missing fields stay absent
pub fn extract_values(body: &Value) -> CalculatedValues {
    let calculated = body.get("measurement_calculated_values");
    let field = |name: &str| {
        calculated
            .and_then(|c| c.get(name))
            .filter(|v| !v.is_null())
    };

    CalculatedValues {
        centile: field("centile").and_then(Value::as_f64),
        sds: field("sds").and_then(Value::as_f64),
        centile_band: field("centile_band").and_then(Value::as_str).map(String::from),
        age_error: field("chronological_decimal_age_error").cloned(),
        corrected_age: field("corrected_decimal_age").cloned(),
        clinical_advice: field("clinician_comment").and_then(Value::as_str).map(String::from),
    }
}
