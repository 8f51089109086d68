//! Test doubles for the growth API

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::models::{CalculatedValues, CalculationOutcome, MeasurementMethod, MeasurementRecord, Sex};

use super::client::CalculationClient;

/// Client returning canned outcomes per method and recording every call
#[derive(Default)]
pub struct ScriptedClient {
    outcomes: HashMap<MeasurementMethod, CalculationOutcome>,
    calls: Mutex<Vec<(MeasurementMethod, Option<String>)>>,
}

impl ScriptedClient {
    pub fn with(mut self, method: MeasurementMethod, outcome: CalculationOutcome) -> Self {
        self.outcomes.insert(method, outcome);
        self
    }

    pub fn centile(centile: f64, sds: f64) -> CalculationOutcome {
        CalculationOutcome::Success(CalculatedValues {
            centile: Some(centile),
            sds: Some(sds),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<(MeasurementMethod, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CalculationClient for ScriptedClient {
    fn calculate(&self, record: &MeasurementRecord, api_key: Option<&str>) -> CalculationOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((record.measurement_method, api_key.map(String::from)));
        self.outcomes
            .get(&record.measurement_method)
            .cloned()
            .unwrap_or_else(|| CalculationOutcome::Success(CalculatedValues::default()))
    }
}

pub fn record(method: MeasurementMethod, value: f64) -> MeasurementRecord {
    MeasurementRecord {
        birth_date: NaiveDate::from_ymd_opt(2020, 12, 25).unwrap(),
        observation_date: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
        observation_value: value,
        measurement_method: method,
        sex: Sex::Male,
        gestation_weeks: 40,
        gestation_days: 0,
    }
}
