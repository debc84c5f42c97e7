//! Polars-backed `DatasetStore` over an in-memory DataFrame snapshot.
//!
//! Predicates are applied as typed Polars expressions, so constraint values
//! never touch a query string. Cells are read with non-strict casts:
//! malformed cells become nulls and flow through the pipeline's row-level
//! exclusion rules instead of failing the whole fetch.

use crate::schema::{DatasetSchema, TechnicalFields};
use crate::store::{DatasetStore, Predicate, RawRecord, RecordRequest, StoreError};
use polars::prelude::*;
use std::collections::BTreeSet;

/// A dataset snapshot held as a Polars DataFrame plus its classified schema.
pub struct FrameStore {
    frame: DataFrame,
    schema: DatasetSchema,
}

impl FrameStore {
    /// Classify the frame's columns and wrap it as a store.
    pub fn new(name: impl Into<String>, frame: DataFrame, technical: &TechnicalFields) -> Self {
        let columns: Vec<String> = frame
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let schema = DatasetSchema::classify(name, &columns, technical);
        Self { frame, schema }
    }

    /// Wrap a frame under a previously classified schema.
    ///
    /// The frame may have drifted from the schema snapshot; fetches detect
    /// the hour-wide-with-no-hourly-columns case explicitly.
    pub fn with_schema(frame: DataFrame, schema: DatasetSchema) -> Self {
        Self { frame, schema }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    fn frame_has_column(&self, column: &str) -> bool {
        self.frame.get_columns().iter().any(|c| c.name().as_str() == column)
    }

    fn unknown_column(&self, column: &str) -> StoreError {
        StoreError::UnknownColumn {
            dataset: self.schema.name.clone(),
            column: column.to_string(),
        }
    }

    /// Apply the conjunctive constraint set and materialize the result.
    fn filtered(&self, constraints: &[Predicate]) -> Result<DataFrame, StoreError> {
        for p in constraints {
            if !self.frame_has_column(&p.column) {
                return Err(self.unknown_column(&p.column));
            }
        }
        if constraints.is_empty() {
            return Ok(self.frame.clone());
        }

        let expr = constraints.iter().fold(lit(true), |acc, p| {
            acc.and(
                col(p.column.as_str())
                    .cast(DataType::String)
                    .eq(lit(p.value.clone())),
            )
        });
        Ok(self.frame.clone().lazy().filter(expr).collect()?)
    }
}

/// Read a column as strings; absent cells come back as `None`.
fn str_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, StoreError> {
    let casted = df.column(column)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Read a column as f64; non-numeric cells become `None` (non-strict cast).
fn f64_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, StoreError> {
    let casted = df.column(column)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

fn i32_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<i32>>, StoreError> {
    let casted = df.column(column)?.cast(&DataType::Int32)?;
    Ok(casted.i32()?.into_iter().collect())
}

/// Read the month-day code column. Stored either numerically or as text;
/// the canonical form is the integer's decimal print (date assembly
/// re-pads it), so go through Int64.
fn code_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, StoreError> {
    let casted = df.column(column)?.cast(&DataType::Int64)?;
    Ok(casted
        .i64()?
        .into_iter()
        .map(|v| v.map(|n| n.to_string()))
        .collect())
}

impl DatasetStore for FrameStore {
    fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    fn distinct_values(
        &self,
        column: &str,
        constraints: &[Predicate],
    ) -> Result<Vec<String>, StoreError> {
        if !self.frame_has_column(column) {
            return Err(self.unknown_column(column));
        }
        let df = self.filtered(constraints)?;
        let distinct: BTreeSet<String> = str_cells(&df, column)?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_empty())
            .collect();
        Ok(distinct.into_iter().collect())
    }

    fn fetch_records(&self, request: &RecordRequest) -> Result<Vec<RawRecord>, StoreError> {
        if let Some(vc) = &request.value_column {
            if !self.frame_has_column(vc) {
                return Err(self.unknown_column(vc));
            }
        }

        let df = self.filtered(&request.constraints)?;
        let n = df.height();
        let tech = self.schema.technical.clone();

        let years = if self.frame_has_column(&tech.year) {
            i32_cells(&df, &tech.year)?
        } else {
            vec![None; n]
        };
        let codes = if self.frame_has_column(&tech.day_code) {
            code_cells(&df, &tech.day_code)?
        } else {
            vec![None; n]
        };
        let versions = if self.frame_has_column(&tech.version) {
            str_cells(&df, &tech.version)?
        } else {
            vec![None; n]
        };

        let mut dims: Vec<(String, Vec<Option<String>>)> = Vec::new();
        for dim in self.schema.dimension_columns() {
            if self.frame_has_column(dim) {
                dims.push((dim.to_string(), str_cells(&df, dim)?));
            }
        }

        let mut hourly: Vec<Vec<Option<f64>>> = Vec::new();
        if self.schema.is_hour_wide() {
            for (name, _) in self.schema.hourly_columns() {
                if self.frame_has_column(name) {
                    hourly.push(f64_cells(&df, name)?);
                }
            }
            // Schema drift: classified hour-wide but the frame no longer
            // carries any hourly column.
            if hourly.is_empty() {
                return Err(StoreError::NoHourlyColumns {
                    dataset: self.schema.name.clone(),
                });
            }
        }

        let singles = match &request.value_column {
            Some(vc) => f64_cells(&df, vc)?,
            None => vec![None; n],
        };

        let mut records = Vec::with_capacity(n);
        for i in 0..n {
            records.push(RawRecord {
                year: years[i],
                day_code: codes[i].clone(),
                version: versions[i].clone(),
                dims: dims
                    .iter()
                    .map(|(name, cells)| (name.clone(), cells[i].clone().unwrap_or_default()))
                    .collect(),
                hourly: hourly.iter().map(|cells| cells[i]).collect(),
                single: singles[i],
            });
        }
        Ok(records)
    }
}
