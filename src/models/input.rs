//! Inbound request model
//!
//! Raw values as posted by a data entry form. Form fields arrive as text, but
//! JSON callers may send numbers, so anthropometric and gestation values accept
//! either.

use std::fmt;

use rmcp::schemars;
use serde::{Deserialize, Serialize};

/// A form value sent as text or as a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// Inbound calculation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RawInput {
    /// Date of birth, in any supported date format
    #[serde(default)]
    pub birth_date: Option<String>,
    /// Date the measurements were taken
    #[serde(default)]
    pub measurement_date: Option<String>,
    /// Sex code: "1" = male, any other value = female
    #[serde(default)]
    pub sex: Option<FieldValue>,
    /// Weight in kg
    #[serde(default)]
    pub weight: Option<FieldValue>,
    /// Height or length in cm
    #[serde(default)]
    pub height: Option<FieldValue>,
    /// Head circumference in cm
    #[serde(default)]
    pub ofc: Option<FieldValue>,
    /// Completed weeks of gestation at birth (default 40)
    #[serde(default)]
    pub gestation_weeks: Option<FieldValue>,
    /// Additional days of gestation (default 0)
    #[serde(default)]
    pub gestation_days: Option<FieldValue>,
    /// Length convention for the height value: height, length, standing_height, supine_length
    #[serde(default)]
    pub measurement_method: Option<String>,
    /// Validation type of the birth date field, e.g. "date_dmy"
    #[serde(default)]
    pub dob_format: Option<String>,
    /// Validation type of the measurement date field, e.g. "date_ymd"
    #[serde(default)]
    pub measurement_date_format: Option<String>,
}

/// Trimmed text, with blanks treated as absent
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RawInput {
    pub fn birth_date(&self) -> Option<String> {
        present(self.birth_date.clone())
    }

    pub fn measurement_date(&self) -> Option<String> {
        present(self.measurement_date.clone())
    }

    pub fn sex(&self) -> Option<String> {
        present(self.sex.as_ref().map(FieldValue::to_string))
    }

    pub fn weight(&self) -> Option<String> {
        present(self.weight.as_ref().map(FieldValue::to_string))
    }

    pub fn height(&self) -> Option<String> {
        present(self.height.as_ref().map(FieldValue::to_string))
    }

    pub fn ofc(&self) -> Option<String> {
        present(self.ofc.as_ref().map(FieldValue::to_string))
    }

    pub fn gestation_weeks(&self) -> Option<String> {
        present(self.gestation_weeks.as_ref().map(FieldValue::to_string))
    }

    pub fn gestation_days(&self) -> Option<String> {
        present(self.gestation_days.as_ref().map(FieldValue::to_string))
    }

    pub fn measurement_method(&self) -> Option<String> {
        present(self.measurement_method.clone())
    }

    pub fn dob_format(&self) -> Option<String> {
        present(self.dob_format.clone())
    }

    pub fn measurement_date_format(&self) -> Option<String> {
        present(self.measurement_date_format.clone())
    }

    /// First required field that is missing or blank, in validation order
    pub fn first_missing_required(&self) -> Option<&'static str> {
        if self.birth_date().is_none() {
            Some("birth_date")
        } else if self.measurement_date().is_none() {
            Some("measurement_date")
        } else if self.sex().is_none() {
            Some("sex")
        } else {
            None
        }
    }

    pub fn has_measurement(&self) -> bool {
        self.weight().is_some() || self.height().is_some() || self.ofc().is_some()
    }
}
