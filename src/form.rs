//! Form write-back
//!
//! Reads a data entry form through the configured field mapping, runs the
//! pipeline and turns the response into output field updates. Centiles are
//! written to 1 decimal place and SDS to 2; any request-level failure clears
//! every output field so stale values never linger.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::calculator::{CalculationClient, CentileHandler};
use crate::config::FieldMapping;
use crate::models::{CalculationOutcome, CentileResponse, MeasurementMethod, RawInput};

/// Field name to current value, as read from the form
pub type FormValues = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Required fields not configured: {}", .0.join(", "))]
    MissingConfiguration(Vec<&'static str>),
}

/// One output field assignment; an empty value clears the field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

impl FieldUpdate {
    fn set(field: &str, value: f64) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    fn clear(field: &str) -> Self {
        Self {
            field: field.to_string(),
            value: String::new(),
        }
    }
}

/// What happened for one form submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOutcome {
    pub instrument: String,
    /// False when the instrument is not a target or inputs were incomplete
    pub calculated: bool,
    pub status: Option<u16>,
    pub message: Option<String>,
    pub updates: Vec<FieldUpdate>,
    pub response: Option<CentileResponse>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;
    // Avoid writing "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

impl FieldMapping {
    /// Instruments the calculator runs on, from the comma-separated setting
    pub fn instruments(&self) -> Vec<&str> {
        self.target_instruments
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn targets(&self, instrument: &str) -> bool {
        self.instruments().contains(&instrument.trim())
    }

    /// The date of birth, sex and measurement date fields must be configured
    pub fn validate(&self) -> Result<(), FormError> {
        let mut missing = Vec::new();
        if self.dob().is_none() {
            missing.push("dob_field");
        }
        if self.sex().is_none() {
            missing.push("sex_field");
        }
        if self.measurement_date().is_none() {
            missing.push("measurement_date_field");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormError::MissingConfiguration(missing))
        }
    }

    /// Every configured centile and SDS output field
    pub fn output_fields(&self) -> Vec<&str> {
        MeasurementMethod::ALL
            .iter()
            .flat_map(|method| {
                let (centile, sds) = self.outputs(*method);
                [centile, sds]
            })
            .flatten()
            .collect()
    }
}

/// Build a calculation request from form values
pub fn collect_input(mapping: &FieldMapping, values: &FormValues) -> RawInput {
    let read = |field: Option<&str>| {
        field
            .and_then(|f| values.get(f))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    RawInput {
        birth_date: read(mapping.dob()),
        measurement_date: read(mapping.measurement_date()),
        sex: read(mapping.sex()).map(Into::into),
        weight: read(mapping.weight()).map(Into::into),
        height: read(mapping.height()).map(Into::into),
        ofc: read(mapping.ofc()).map(Into::into),
        gestation_weeks: read(mapping.gestation_weeks()).map(Into::into),
        gestation_days: read(mapping.gestation_days()).map(Into::into),
        measurement_method: Some(MeasurementMethod::Height.as_str().to_string()),
        dob_format: mapping.dob_validation.clone(),
        measurement_date_format: mapping.measurement_date_validation.clone(),
    }
}

/// Updates clearing every configured output field
pub fn clear_outputs(mapping: &FieldMapping) -> Vec<FieldUpdate> {
    mapping
        .output_fields()
        .into_iter()
        .map(FieldUpdate::clear)
        .collect()
}

/// Translate a response into output field updates
pub fn field_updates(mapping: &FieldMapping, response: &CentileResponse) -> Vec<FieldUpdate> {
    let results = match (&response.results, response.success) {
        (Some(results), true) => results,
        _ => return clear_outputs(mapping),
    };

    let mut updates = Vec::new();
    for (method, outcome) in results {
        let (centile_field, sds_field) = mapping.outputs(*method);
        match outcome {
            CalculationOutcome::Success(values) => {
                if let (Some(field), Some(centile)) = (centile_field, values.centile) {
                    updates.push(FieldUpdate::set(field, round_to(centile, 1)));
                }
                if let (Some(field), Some(sds)) = (sds_field, values.sds) {
                    updates.push(FieldUpdate::set(field, round_to(sds, 2)));
                }
            }
            CalculationOutcome::Failure { error } => {
                tracing::warn!("{} calculation error: {}", method.display_name(), error);
            }
        }
    }
    updates
}

/// Run the calculator for one form submission
pub fn run_form<C: CalculationClient>(
    handler: &CentileHandler<C>,
    mapping: &FieldMapping,
    instrument: &str,
    values: &FormValues,
) -> Result<FormOutcome, FormError> {
    let skipped = |message: &str, updates: Vec<FieldUpdate>| FormOutcome {
        instrument: instrument.to_string(),
        calculated: false,
        status: None,
        message: Some(message.to_string()),
        updates,
        response: None,
    };

    if !mapping.targets(instrument) {
        return Ok(skipped("Instrument is not configured for centile calculation", Vec::new()));
    }
    mapping.validate()?;

    let input = collect_input(mapping, values);
    if input.first_missing_required().is_some() {
        return Ok(skipped(
            "Missing required fields (DOB, Sex, or Measurement Date)",
            clear_outputs(mapping),
        ));
    }
    if !input.has_measurement() {
        return Ok(skipped("No measurement provided", clear_outputs(mapping)));
    }

    let handled = handler.handle(&input);
    Ok(FormOutcome {
        instrument: instrument.to_string(),
        calculated: true,
        status: Some(handled.status.as_u16()),
        message: handled.body.error.clone(),
        updates: field_updates(mapping, &handled.body),
        response: Some(handled.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::testing::ScriptedClient;
    use crate::models::{AggregatedResult, CalculatedValues};

    fn mapping() -> FieldMapping {
        FieldMapping {
            target_instruments: Some("growth, clinic_visit ,".into()),
            weight_field: Some("wt".into()),
            height_field: Some("ht".into()),
            dob_field: Some("dob".into()),
            sex_field: Some("sex".into()),
            measurement_date_field: Some("visit_date".into()),
            gestation_weeks_field: Some("gest_wk".into()),
            dob_validation: Some("date_dmy".into()),
            weight_centile_field: Some("wt_cent".into()),
            weight_sds_field: Some("wt_sds".into()),
            height_centile_field: Some("ht_cent".into()),
            height_sds_field: Some("ht_sds".into()),
            bmi_centile_field: Some("bmi_cent".into()),
            bmi_sds_field: Some("bmi_sds".into()),
            ..Default::default()
        }
    }

    fn form(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn complete_form() -> FormValues {
        form(&[
            ("dob", "25-12-2020"),
            ("sex", "2"),
            ("visit_date", "01-06-2022"),
            ("wt", " 12.5 "),
            ("ht", "90"),
            ("gest_wk", ""),
        ])
    }

    #[test]
    fn test_targets() {
        let mapping = mapping();
        assert_eq!(mapping.instruments(), vec!["growth", "clinic_visit"]);
        assert!(mapping.targets("clinic_visit"));
        assert!(!mapping.targets("demographics"));
        assert!(!FieldMapping::default().targets("growth"));
    }

    #[test]
    fn test_validate() {
        assert!(mapping().validate().is_ok());
        let err = FieldMapping::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required fields not configured: dob_field, sex_field, measurement_date_field"
        );
    }

    #[test]
    fn test_collect_input() {
        let input = collect_input(&mapping(), &complete_form());
        assert_eq!(input.birth_date.as_deref(), Some("25-12-2020"));
        assert_eq!(input.weight(), Some("12.5".to_string()));
        assert_eq!(input.gestation_weeks, None);
        assert_eq!(input.ofc, None);
        assert_eq!(input.measurement_method.as_deref(), Some("height"));
        assert_eq!(input.dob_format.as_deref(), Some("date_dmy"));
    }

    #[test]
    fn test_field_updates_round_values() {
        let mut results = AggregatedResult::new();
        results.insert(
            MeasurementMethod::Weight,
            CalculationOutcome::Success(CalculatedValues {
                centile: Some(48.2467),
                sds: Some(-0.0449),
                ..Default::default()
            }),
        );
        results.insert(
            MeasurementMethod::Bmi,
            CalculationOutcome::Success(CalculatedValues {
                centile: Some(91.96),
                sds: None,
                ..Default::default()
            }),
        );
        results.insert(MeasurementMethod::Height, CalculationOutcome::failure("not found"));

        let updates = field_updates(&mapping(), &CentileResponse::completed(results));

        assert_eq!(
            updates,
            vec![
                FieldUpdate { field: "wt_cent".into(), value: "48.2".into() },
                FieldUpdate { field: "wt_sds".into(), value: "-0.04".into() },
                FieldUpdate { field: "bmi_cent".into(), value: "92".into() },
            ]
        );
    }

    #[test]
    fn test_negative_zero_is_written_as_zero() {
        assert_eq!(round_to(-0.004, 2).to_string(), "0");
    }

    #[test]
    fn test_failure_clears_outputs() {
        let updates = field_updates(&mapping(), &CentileResponse::failed("Invalid date format: x"));
        assert_eq!(updates.len(), 6);
        assert!(updates.iter().all(|u| u.value.is_empty()));
    }

    #[test]
    fn test_run_form_skips_other_instruments() {
        let handler = CentileHandler::new(ScriptedClient::default(), None);
        let outcome = run_form(&handler, &mapping(), "demographics", &complete_form()).unwrap();
        assert!(!outcome.calculated);
        assert!(outcome.updates.is_empty());
        assert!(handler.client().calls().is_empty());
    }

    #[test]
    fn test_run_form_incomplete_inputs_clear_without_calling() {
        let handler = CentileHandler::new(ScriptedClient::default(), None);

        let no_sex = form(&[("dob", "25-12-2020"), ("visit_date", "01-06-2022"), ("wt", "12.5")]);
        let outcome = run_form(&handler, &mapping(), "growth", &no_sex).unwrap();
        assert!(!outcome.calculated);
        assert_eq!(outcome.updates.len(), 6);

        let no_measurement = form(&[("dob", "25-12-2020"), ("sex", "1"), ("visit_date", "01-06-2022")]);
        let outcome = run_form(&handler, &mapping(), "growth", &no_measurement).unwrap();
        assert_eq!(outcome.message.as_deref(), Some("No measurement provided"));

        assert!(handler.client().calls().is_empty());
    }

    #[test]
    fn test_run_form_writes_results() {
        let client = ScriptedClient::default()
            .with(MeasurementMethod::Weight, ScriptedClient::centile(61.34, 0.287))
            .with(MeasurementMethod::Height, ScriptedClient::centile(12.0, -1.17));
        let handler = CentileHandler::new(client, None);

        let outcome = run_form(&handler, &mapping(), "growth", &complete_form()).unwrap();

        assert!(outcome.calculated);
        assert_eq!(outcome.status, Some(200));
        assert_eq!(handler.client().calls().len(), 3);
        assert!(outcome.updates.contains(&FieldUpdate { field: "wt_cent".into(), value: "61.3".into() }));
        assert!(outcome.updates.contains(&FieldUpdate { field: "wt_sds".into(), value: "0.29".into() }));
        assert!(outcome.updates.contains(&FieldUpdate { field: "ht_sds".into(), value: "-1.17".into() }));
    }

    #[test]
    fn test_run_form_unconfigured_mapping() {
        let handler = CentileHandler::new(ScriptedClient::default(), None);
        let mapping = FieldMapping {
            target_instruments: Some("growth".into()),
            ..Default::default()
        };
        assert!(matches!(
            run_form(&handler, &mapping, "growth", &complete_form()),
            Err(FormError::MissingConfiguration(_))
        ));
    }

    #[test]
    fn test_run_form_request_failure_clears() {
        let handler = CentileHandler::new(ScriptedClient::default(), None);
        let mut values = complete_form();
        values.insert("dob".into(), "not a date".into());

        let outcome = run_form(&handler, &mapping(), "growth", &values).unwrap();

        assert!(outcome.calculated);
        assert_eq!(outcome.status, Some(500));
        assert_eq!(outcome.message.as_deref(), Some("Invalid date format: not a date"));
        assert!(outcome.updates.iter().all(|u| u.value.is_empty()));
    }
}
