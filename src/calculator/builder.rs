//! Measurement request builder
//!
//! Turns one raw form submission into the per-measurement records the growth
//! API expects. BMI is always derived from weight and height, never accepted
//! as input.

use chrono::NaiveDate;

use crate::models::{MeasurementMethod, MeasurementRecord, RawInput, Sex};

use super::dates::DateNormalizer;
use super::error::{CentileError, CentileResult};

/// Gestation assumed when none is recorded (term birth)
pub const DEFAULT_GESTATION_WEEKS: u32 = 40;
pub const DEFAULT_GESTATION_DAYS: u32 = 0;

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// BMI from weight in kg and height in cm, rounded to 2 decimal places
pub fn derive_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / height_m.powi(2))
}

/// Parse a measurement value. Zero counts as not measured; any other finite
/// number is passed on and left for the API to accept or reject.
fn parse_measurement(field: &'static str, text: &str) -> CentileResult<Option<f64>> {
    match text.parse::<f64>() {
        Ok(value) if value == 0.0 => Ok(None),
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(CentileError::InvalidMeasurement {
            field,
            value: text.to_string(),
        }),
    }
}

/// Parse a gestation component, falling back to `default` when absent
fn parse_gestation(field: &'static str, text: Option<String>, default: u32) -> CentileResult<u32> {
    let Some(text) = text else {
        return Ok(default);
    };

    // Form integers sometimes come through as "32.0"
    let parsed = text.parse::<u32>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    });

    parsed.ok_or(CentileError::InvalidMeasurement { field, value: text })
}

/// Fields shared by every record built from one submission
#[derive(Debug, Clone, Copy)]
struct Subject {
    birth_date: NaiveDate,
    observation_date: NaiveDate,
    sex: Sex,
    gestation_weeks: u32,
    gestation_days: u32,
}

impl Subject {
    fn record(&self, method: MeasurementMethod, value: f64) -> MeasurementRecord {
        MeasurementRecord {
            birth_date: self.birth_date,
            observation_date: self.observation_date,
            observation_value: value,
            measurement_method: method,
            sex: self.sex,
            gestation_weeks: self.gestation_weeks,
            gestation_days: self.gestation_days,
        }
    }
}

/// Builds growth API request records from raw form input
#[derive(Debug, Clone, Default)]
pub struct MeasurementRequestBuilder {
    dates: DateNormalizer,
}

impl MeasurementRequestBuilder {
    pub fn new(dates: DateNormalizer) -> Self {
        Self { dates }
    }

    /// Build one record per measurement present, plus BMI when both weight and
    /// height are given. Records come out in weight, height, bmi, ofc order.
    pub fn build(&self, input: &RawInput) -> CentileResult<Vec<MeasurementRecord>> {
        let birth_text = input
            .birth_date()
            .ok_or(CentileError::MissingField("birth_date"))?;
        let observation_text = input
            .measurement_date()
            .ok_or(CentileError::MissingField("measurement_date"))?;
        let sex_code = input.sex().ok_or(CentileError::MissingField("sex"))?;

        let weight = input
            .weight()
            .map(|w| parse_measurement("weight", &w))
            .transpose()?
            .flatten();
        let height = input
            .height()
            .map(|h| parse_measurement("height", &h))
            .transpose()?
            .flatten();
        let ofc = input
            .ofc()
            .map(|o| parse_measurement("ofc", &o))
            .transpose()?
            .flatten();

        if weight.is_none() && height.is_none() && ofc.is_none() {
            return Err(CentileError::MissingMeasurement);
        }

        let height_method = match input.measurement_method() {
            Some(hint) => MeasurementMethod::from_length_hint(&hint)
                .ok_or(CentileError::UnsupportedMethod(hint))?,
            None => MeasurementMethod::Height,
        };

        let subject = Subject {
            birth_date: self
                .dates
                .normalize(&birth_text, input.dob_format().as_deref())?,
            observation_date: self
                .dates
                .normalize(&observation_text, input.measurement_date_format().as_deref())?,
            sex: Sex::from_form_code(&sex_code),
            gestation_weeks: parse_gestation(
                "gestation_weeks",
                input.gestation_weeks(),
                DEFAULT_GESTATION_WEEKS,
            )?,
            gestation_days: parse_gestation(
                "gestation_days",
                input.gestation_days(),
                DEFAULT_GESTATION_DAYS,
            )?,
        };

        let mut records = Vec::with_capacity(4);
        if let Some(w) = weight {
            records.push(subject.record(MeasurementMethod::Weight, w));
        }
        if let Some(h) = height {
            records.push(subject.record(height_method, h));
        }
        // BMI from a negative weight or height would be meaningless
        if let (Some(w), Some(h)) = (weight.filter(|w| *w > 0.0), height.filter(|h| *h > 0.0)) {
            records.push(subject.record(MeasurementMethod::Bmi, derive_bmi(w, h)));
        }
        if let Some(o) = ofc {
            records.push(subject.record(MeasurementMethod::Ofc, o));
        }

        tracing::debug!(
            "Built {} measurement record(s) for observation on {}",
            records.len(),
            subject.observation_date
        );

        Ok(records)
    }
}
