//! Auto Centile Calculator
//!
//! An MCP server calculating growth centiles through the RCPCH growth API.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use autocentile::build_info;
use autocentile::config::{CentileConfig, ENV_API_KEY};
use autocentile::mcp::CentileService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("autocentile=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = CentileConfig::from_env()?;
    eprintln!("Growth API endpoint: {}", config.endpoint());

    if config.strict_dates {
        tracing::info!("Strict date parsing: dates must match a hinted or candidate format exactly");
    }

    if config.api_key.is_none() {
        tracing::warn!("{} is not set; growth API requests will be unauthenticated", ENV_API_KEY);
    }

    match config.fields.validate() {
        Ok(()) => eprintln!(
            "Form write-back enabled for instruments: {}",
            config.fields.instruments().join(", ")
        ),
        Err(e) => tracing::info!("Form write-back unavailable: {}", e),
    }

    let service = CentileService::new(config);

    // Create stdio transport
    let transport = (stdin(), stdout());

    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
