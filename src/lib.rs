//! Auto Centile Calculator Library
//!
//! Builds growth API requests from form measurements, calls the RCPCH growth
//! API once per measurement and normalizes the results for write-back.

pub mod build_info;
pub mod calculator;
pub mod config;
pub mod form;
pub mod mcp;
pub mod models;
pub mod tools;
