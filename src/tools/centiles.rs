//! Centile MCP Tools
//!
//! Blocking tool functions; the server runs them off the async runtime.

use serde::Serialize;

use crate::calculator::{CalculationClient, CentileHandler};
use crate::config::FieldMapping;
use crate::form::{self, FormOutcome, FormValues};
use crate::models::{CentileResponse, RawInput};

/// Response for calculate_centiles
#[derive(Debug, Serialize)]
pub struct CalculateCentilesResponse {
    /// HTTP-equivalent status: 200, 400 for invalid requests, 500 for failed ones
    pub status: u16,
    pub response: CentileResponse,
}

/// Calculate centiles for one request
pub fn calculate_centiles<C: CalculationClient>(
    handler: &CentileHandler<C>,
    input: &RawInput,
) -> CalculateCentilesResponse {
    let handled = handler.handle(input);
    CalculateCentilesResponse {
        status: handled.status.as_u16(),
        response: handled.body,
    }
}

/// Calculate centiles for a data entry form and return the output field updates
pub fn calculate_form_centiles<C: CalculationClient>(
    handler: &CentileHandler<C>,
    mapping: &FieldMapping,
    instrument: &str,
    values: &FormValues,
) -> Result<FormOutcome, String> {
    form::run_form(handler, mapping, instrument, values)
        .map_err(|e| format!("Form calculation unavailable: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::testing::ScriptedClient;
    use crate::models::{CalculationOutcome, MeasurementMethod};

    #[test]
    fn test_calculate_centiles_reports_status() {
        let client = ScriptedClient::default()
            .with(MeasurementMethod::Ofc, CalculationOutcome::failure("API error: HTTP 503"));
        let handler = CentileHandler::new(client, None);
        let input = RawInput {
            birth_date: Some("2021-02-03".into()),
            measurement_date: Some("2021-09-03".into()),
            sex: Some("2".into()),
            ofc: Some("43.0".into()),
            ..Default::default()
        };

        let result = calculate_centiles(&handler, &input);
        assert_eq!(result.status, 200);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["response"]["results"]["ofc"]["error"], "API error: HTTP 503");

        let missing = RawInput {
            sex: None,
            ..input
        };
        assert_eq!(calculate_centiles(&handler, &missing).status, 400);
    }

    #[test]
    fn test_calculate_form_centiles_unconfigured() {
        let handler = CentileHandler::new(ScriptedClient::default(), None);
        let mapping = FieldMapping {
            target_instruments: Some("growth".into()),
            ..Default::default()
        };
        let err = calculate_form_centiles(&handler, &mapping, "growth", &FormValues::new()).unwrap_err();
        assert!(err.starts_with("Form calculation unavailable: Required fields not configured"));
    }
}
