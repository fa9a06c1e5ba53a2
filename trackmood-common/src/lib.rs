//! # Trackmood Common Library
//!
//! Shared code for the trackmood crates:
//! - The `FeatureRecord` value produced by the analyzer
//! - Error types
//! - TOML configuration loading and resolution

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::FeatureRecord;
