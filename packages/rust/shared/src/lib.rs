//! Shared types, error model, and configuration for docstitch.
//!
//! This crate is the foundation depended on by all other docstitch crates.
//! It provides:
//! - [`DocstitchError`] — the unified error type
//! - Domain types ([`RawFieldSet`], [`BatchId`], [`PageSource`], [`MismatchReport`])
//! - Configuration ([`AppConfig`], [`ProviderConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ProviderConfig, ProviderSettings, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{DocstitchError, Result};
pub use types::{
    BatchId, ComparisonStatus, FieldDispute, IdentifierComparison, MismatchReport, PageSource,
    RawFieldSet,
};
