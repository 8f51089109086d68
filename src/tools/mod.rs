//! Autocentile tools module
//!
//! MCP tool implementations for the centile calculator.

pub mod centiles;
pub mod status;
