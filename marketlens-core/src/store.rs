//! Dataset access seam.
//!
//! The core never owns table storage. It requires two capabilities from the
//! storage layer: list distinct values of a named column under a conjunctive
//! equality constraint set, and fetch full rows under the same constraint
//! set. Constraints are typed (column, value) predicates applied
//! structurally by the backend — never spliced into a query string.
//!
//! Implementations must provide snapshot-consistent reads for the duration
//! of one call; the core takes no locks and performs no writes.

use crate::schema::DatasetSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A typed equality constraint over one named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub value: String,
}

impl Predicate {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Row fetch request: conjunctive constraints plus, for single-value
/// datasets, the value column to extract.
#[derive(Debug, Clone, Default)]
pub struct RecordRequest {
    pub constraints: Vec<Predicate>,
    pub value_column: Option<String>,
}

/// One fetched row, before date assembly and version resolution.
///
/// Fields the backend could not read (missing column, malformed cell) come
/// back as `None`; the pipeline decides what that means per field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub year: Option<i32>,
    pub day_code: Option<String>,
    pub version: Option<String>,
    /// Dimension values in schema order. Missing cells read as "".
    pub dims: Vec<(String, String)>,
    /// Hourly cells ordered by hour; empty for single-value datasets.
    pub hourly: Vec<Option<f64>>,
    /// The requested value cell, for single-value datasets.
    pub single: Option<f64>,
}

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown column '{column}' in dataset '{dataset}'")]
    UnknownColumn { dataset: String, column: String },

    #[error("dataset '{dataset}' is hour-wide but has no usable hourly columns")]
    NoHourlyColumns { dataset: String },

    #[error("backend error: {0}")]
    Backend(#[from] polars::error::PolarsError),
}

/// Read capability over one dataset snapshot.
pub trait DatasetStore {
    /// The classified schema of the dataset this store serves.
    fn schema(&self) -> &DatasetSchema;

    /// Distinct values of `column` among rows satisfying every constraint,
    /// sorted ascending. Constraints never reference `column` itself when
    /// called from the cascade resolver, but the store does not care.
    fn distinct_values(
        &self,
        column: &str,
        constraints: &[Predicate],
    ) -> Result<Vec<String>, StoreError>;

    /// Fetch rows satisfying every constraint.
    fn fetch_records(&self, request: &RecordRequest) -> Result<Vec<RawRecord>, StoreError>;
}
