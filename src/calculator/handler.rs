//! Request handler
//!
//! Entry point of the pipeline: validate, build records, calculate, and wrap
//! everything in the response envelope.

use reqwest::StatusCode;

use crate::config::CentileConfig;
use crate::models::{AggregatedResult, CentileResponse, RawInput};

use super::aggregator::aggregate;
use super::builder::MeasurementRequestBuilder;
use super::client::{CalculationClient, HttpCalculationClient};
use super::dates::DateNormalizer;
use super::error::{CentileError, CentileResult};

/// Response body plus the HTTP-equivalent status it should be sent with
#[derive(Debug, Clone, PartialEq)]
pub struct HandledRequest {
    pub status: StatusCode,
    pub body: CentileResponse,
}

impl HandledRequest {
    fn from_error(err: CentileError) -> Self {
        Self {
            status: err.status(),
            body: CentileResponse::failed(err.to_string()),
        }
    }
}

/// Runs one calculation request end to end
pub struct CentileHandler<C> {
    client: C,
    builder: MeasurementRequestBuilder,
    api_key: Option<String>,
}

impl CentileHandler<HttpCalculationClient> {
    /// Handler talking to the configured growth API endpoint
    pub fn from_config(config: &CentileConfig) -> Self {
        let dates = if config.strict_dates {
            DateNormalizer::strict()
        } else {
            DateNormalizer::default()
        };
        Self::new(HttpCalculationClient::new(config.endpoint()), config.api_key.clone())
            .with_builder(MeasurementRequestBuilder::new(dates))
    }
}

impl<C: CalculationClient> CentileHandler<C> {
    pub fn new(client: C, api_key: Option<String>) -> Self {
        Self {
            client,
            builder: MeasurementRequestBuilder::default(),
            api_key,
        }
    }

    pub fn with_builder(mut self, builder: MeasurementRequestBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Handle a decoded request.
    ///
    /// Per-measurement remote failures still produce a 200 with the error under
    /// that method; anything else aborts the request with `success: false`.
    pub fn handle(&self, input: &RawInput) -> HandledRequest {
        match self.run(input) {
            Ok(results) => {
                tracing::info!("Calculated {} measurement(s)", results.len());
                HandledRequest {
                    status: StatusCode::OK,
                    body: CentileResponse::completed(results),
                }
            }
            Err(err) => {
                tracing::warn!("Centile request failed: {}", err);
                HandledRequest::from_error(err)
            }
        }
    }

    /// Handle a raw JSON request body
    pub fn handle_json(&self, body: &str) -> HandledRequest {
        match serde_json::from_str::<RawInput>(body) {
            Ok(input) => self.handle(&input),
            Err(err) => {
                tracing::warn!("Rejected malformed request body: {}", err);
                HandledRequest::from_error(err.into())
            }
        }
    }

    fn run(&self, input: &RawInput) -> CentileResult<AggregatedResult> {
        if let Some(field) = input.first_missing_required() {
            return Err(CentileError::MissingField(field));
        }

        let records = self.builder.build(input)?;
        Ok(aggregate(&self.client, &records, self.api_key.as_deref()))
    }
}
