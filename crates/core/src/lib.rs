//! Core types and configuration for the marketplace hub.
//!
//! This crate provides shared types used across all other crates:
//! - Canonical sales records (daily, SKU, region, hourly, weekday)
//! - Marketplace bundles, the bundle store and goal configuration
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
