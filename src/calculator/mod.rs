//! Centile calculation pipeline
//!
//! Date normalization, request building, growth API calls and aggregation.

pub mod aggregator;
pub mod builder;
pub mod client;
pub mod dates;
pub mod error;
pub mod handler;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::aggregate;
pub use builder::{derive_bmi, MeasurementRequestBuilder};
pub use client::{classify_response, CalculationClient, HttpCalculationClient, REQUEST_TIMEOUT};
pub use dates::{DateFormatHint, DateNormalizer};
pub use error::{CentileError, CentileResult, RemoteError};
pub use handler::{CentileHandler, HandledRequest};
