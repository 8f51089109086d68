//! Autocentile MCP Server Implementation
//!
//! Exposes the centile calculator as MCP tools. Growth API calls block, so
//! calculations run on tokio's blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::calculator::{CentileHandler, HttpCalculationClient};
use crate::config::{CentileConfig, FieldMapping};
use crate::models::RawInput;
use crate::tools::centiles;
use crate::tools::status::StatusTracker;

/// Autocentile MCP Service
#[derive(Clone)]
pub struct CentileService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    handler: Arc<CentileHandler<HttpCalculationClient>>,
    fields: Arc<FieldMapping>,
    tool_router: ToolRouter<CentileService>,
}

impl CentileService {
    pub fn new(config: CentileConfig) -> Self {
        Self {
            handler: Arc::new(CentileHandler::from_config(&config)),
            fields: Arc::new(config.fields.clone()),
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(config))),
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateFormCentilesParams {
    /// Instrument (form) name; only configured target instruments are calculated
    pub instrument: String,
    /// Current form values keyed by field name
    pub values: HashMap<String, String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl CentileService {
    #[tool(description = "Get the current status of the autocentile service including build info, growth API configuration, and process information")]
    async fn autocentile_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        to_json(&tracker.get_status())
    }

    #[tool(description = "Get instructions for calculating growth centiles. Call this before the first calculation or when unsure which fields to send.")]
    fn centile_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::CENTILE_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(CENTILE_INSTRUCTIONS)]))
    }

    #[tool(description = "Calculate growth centiles and SDS for weight, height, BMI and head circumference via the RCPCH growth API. Requires birth_date, measurement_date, sex and at least one measurement.")]
    async fn calculate_centiles(&self, Parameters(p): Parameters<RawInput>) -> Result<CallToolResult, McpError> {
        let handler = Arc::clone(&self.handler);
        let result = tokio::task::spawn_blocking(move || centiles::calculate_centiles(handler.as_ref(), &p))
            .await
            .map_err(|e| McpError::internal_error(format!("Calculation task failed: {}", e), None))?;
        to_json(&result)
    }

    #[tool(description = "Calculate centiles for a data entry form using the configured field mapping. Returns the output fields to update; an empty value means clear the field.")]
    async fn calculate_form_centiles(&self, Parameters(p): Parameters<CalculateFormCentilesParams>) -> Result<CallToolResult, McpError> {
        let handler = Arc::clone(&self.handler);
        let fields = Arc::clone(&self.fields);
        let result = tokio::task::spawn_blocking(move || {
            centiles::calculate_form_centiles(handler.as_ref(), fields.as_ref(), &p.instrument, &p.values)
        })
        .await
        .map_err(|e| McpError::internal_error(format!("Calculation task failed: {}", e), None))?
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for CentileService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "autocentile".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Auto Centile Calculator".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Auto Centile Calculator - growth centiles and SDS from the RCPCH growth API. \
                 IMPORTANT: Call centile_instructions before the first calculation. \
                 Calculate: calculate_centiles (explicit values), calculate_form_centiles (form field mapping). \
                 Status: autocentile_status."
                    .into(),
            ),
        }
    }
}
