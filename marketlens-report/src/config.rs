//! Serializable report configuration.
//!
//! A report names a dataset file, a reduction operator, an optional date
//! range, and a list of blocks. Each block carries a label and its own
//! fixed filters; an empty filter map means the unfiltered series.

use chrono::NaiveDate;
use marketlens_core::reduce::ReduceOp;
use marketlens_core::schema::TechnicalFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::ReportError;

/// One report: a dataset plus a set of independently filtered blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Path to the dataset file (CSV or Parquet).
    pub dataset: PathBuf,

    /// Display name; defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Reduction operator applied both horizontally and per date.
    #[serde(default)]
    pub op: ReduceOp,

    /// Inclusive date range; open ends admit everything.
    #[serde(default)]
    pub start: Option<NaiveDate>,

    #[serde(default)]
    pub end: Option<NaiveDate>,

    /// Value column, required for single-value datasets.
    #[serde(default)]
    pub value_column: Option<String>,

    /// Technical-column name overrides.
    #[serde(default)]
    pub technical: TechnicalFields,

    /// Blocks laid out side by side in the export.
    pub blocks: Vec<BlockConfig>,
}

/// One table block: a label and its own conjunctive filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub label: String,

    /// Dimension column → required value.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl ReportConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ReportError> {
        let config: ReportConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, ReportError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ReportError> {
        if self.blocks.is_empty() {
            return Err(ReportError::Config("report has no blocks".into()));
        }
        let mut seen = std::collections::BTreeSet::new();
        for block in &self.blocks {
            if block.label.trim().is_empty() {
                return Err(ReportError::Config("block label must not be empty".into()));
            }
            if !seen.insert(&block.label) {
                return Err(ReportError::Config(format!(
                    "duplicate block label '{}'",
                    block.label
                )));
            }
        }
        Ok(())
    }

    /// Display name for headings.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => self
                .dataset
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset".to_string()),
        }
    }
}
