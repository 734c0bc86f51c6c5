//! Command implementations for the CLI
//!
//! - start: Start the HTTP server
//! - config: Display the effective configuration

pub mod config;
pub mod start;
