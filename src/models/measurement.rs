//! Measurement model
//!
//! A single anthropometric observation shaped the way the growth API expects it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Measurement method understood by the growth API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMethod {
    Weight,
    Height,
    Bmi,
    Ofc,
}

impl MeasurementMethod {
    pub const ALL: [MeasurementMethod; 4] = [
        MeasurementMethod::Weight,
        MeasurementMethod::Height,
        MeasurementMethod::Bmi,
        MeasurementMethod::Ofc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementMethod::Weight => "weight",
            MeasurementMethod::Height => "height",
            MeasurementMethod::Bmi => "bmi",
            MeasurementMethod::Ofc => "ofc",
        }
    }

    /// Resolve the method hint sent alongside a height value.
    ///
    /// Supine length and standing height are both reported to the API as
    /// `height`; any non-length method is rejected.
    pub fn from_length_hint(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "height" | "length" | "standing_height" | "supine_length" => {
                Some(MeasurementMethod::Height)
            }
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MeasurementMethod::Weight => "Weight",
            MeasurementMethod::Height => "Height",
            MeasurementMethod::Bmi => "BMI",
            MeasurementMethod::Ofc => "Head Circumference",
        }
    }
}

/// Sex as understood by the growth API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Form coding: "1" is male, anything else is female
    pub fn from_form_code(code: &str) -> Self {
        if code.trim() == "1" {
            Sex::Male
        } else {
            Sex::Female
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Request body for one growth API calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub birth_date: NaiveDate,
    pub observation_date: NaiveDate,
    pub observation_value: f64,
    pub measurement_method: MeasurementMethod,
    pub sex: Sex,
    pub gestation_weeks: u32,
    pub gestation_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_from_form_code() {
        assert_eq!(Sex::from_form_code("1"), Sex::Male);
        assert_eq!(Sex::from_form_code(" 1 "), Sex::Male);
        assert_eq!(Sex::from_form_code("2"), Sex::Female);
        assert_eq!(Sex::from_form_code("F"), Sex::Female);
        assert_eq!(Sex::from_form_code(""), Sex::Female);
    }

    #[test]
    fn test_length_hint() {
        assert_eq!(MeasurementMethod::from_length_hint("height"), Some(MeasurementMethod::Height));
        assert_eq!(MeasurementMethod::from_length_hint("Supine-Length"), Some(MeasurementMethod::Height));
        assert_eq!(MeasurementMethod::from_length_hint("weight"), None);
        assert_eq!(MeasurementMethod::from_length_hint("bmi"), None);
    }

    #[test]
    fn test_method_names_match_serde() {
        for method in MeasurementMethod::ALL {
            assert_eq!(serde_json::to_value(method).unwrap(), method.as_str());
        }
    }

    #[test]
    fn test_record_serializes_with_api_field_names() {
        let record = MeasurementRecord {
            birth_date: NaiveDate::from_ymd_opt(2020, 12, 25).unwrap(),
            observation_date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            observation_value: 8.4,
            measurement_method: MeasurementMethod::Weight,
            sex: Sex::Female,
            gestation_weeks: 40,
            gestation_days: 0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["birth_date"], "2020-12-25");
        assert_eq!(json["observation_date"], "2021-06-01");
        assert_eq!(json["observation_value"], 8.4);
        assert_eq!(json["measurement_method"], "weight");
        assert_eq!(json["sex"], "female");
        assert_eq!(json["gestation_weeks"], 40);
        assert_eq!(json["gestation_days"], 0);
    }
}
