//! # QKD Common Library
//!
//! Shared code for the QKD telemetry ingest workspace:
//! - Common error type and result alias
//! - TOML configuration loading and config file resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
