//! Data models
//!
//! Inbound request, outbound measurement records and normalized outcomes.

mod input;
mod measurement;
mod outcome;

pub use input::{FieldValue, RawInput};
pub use measurement::{MeasurementMethod, MeasurementRecord, Sex};
pub use outcome::{AggregatedResult, CalculatedValues, CalculationOutcome, CentileResponse};
