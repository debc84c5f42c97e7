//! MarketLens Report — orchestration around the core pipeline.
//!
//! Turns a TOML report configuration into a set of independently filtered
//! table blocks laid out side by side, and exports blocks or single series
//! as CSV for the spreadsheet/plot collaborators.

pub mod blocks;
pub mod config;
pub mod export;
pub mod loader;

pub use blocks::{build_report, ReportBlock};
pub use config::{BlockConfig, ReportConfig};
pub use export::{write_report_csv, write_series_csv};
pub use loader::open_store;

use thiserror::Error;

/// Errors from report building and export.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("config error: {0}")]
    Config(String),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("load error: {0}")]
    Load(String),

    #[error(transparent)]
    Query(#[from] marketlens_core::query::QueryError),
}
