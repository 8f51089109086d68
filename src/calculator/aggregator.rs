//! Result aggregation
//!
//! Runs the client over every record of a request and keys the outcomes by
//! measurement method.

use crate::models::{AggregatedResult, MeasurementRecord};

use super::client::CalculationClient;

/// Calculate every record in turn; a failed record only fails its own entry
pub fn aggregate<C>(client: &C, records: &[MeasurementRecord], api_key: Option<&str>) -> AggregatedResult
where
    C: CalculationClient + ?Sized,
{
    let mut results = AggregatedResult::new();

    for record in records {
        let method = record.measurement_method;
        let outcome = client.calculate(record, api_key);
        let previous = results.insert(method, outcome);
        // The builder emits at most one record per method
        assert!(previous.is_none(), "duplicate {} record in one request", method.as_str());
    }

    let failed = results.values().filter(|o| !o.is_success()).count();
    if failed > 0 {
        tracing::warn!("{} of {} measurement calculation(s) failed", failed, results.len());
    }

    results
}
