//! The series pipeline: fetch → date assembly → version resolution →
//! reduction → temporal aggregation.
//!
//! This is the path behind every plot and report column. Row-level defects
//! (unparseable date, non-numeric cell) are excluded silently and counted;
//! query-shape defects (no usable hourly columns, nothing left after
//! filters) and configuration defects (unknown columns) are explicit
//! errors so the caller can show "no data" instead of an empty chart.

use crate::aggregate::{aggregate_daily, SeriesPoint};
use crate::dates::assemble_opt;
use crate::reduce::{reduce_hourly, ReduceOp};
use crate::schema::{ColumnRole, DatasetKind};
use crate::store::{DatasetStore, Predicate, RecordRequest, StoreError};
use crate::version::{resolve_latest, ResolveDiagnostics, ResolvedRecord, VersionWeights};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive date range; open ends admit everything on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateSpan {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// One daily-series query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesQuery {
    /// Fixed dimension filters, conjunctive equality.
    pub filters: Vec<Predicate>,
    pub span: DateSpan,
    pub op: ReduceOp,
    /// Value column for single-value datasets; ignored for hour-wide ones.
    pub value_column: Option<String>,
}

/// The authoritative daily series plus its observability counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub points: Vec<SeriesPoint>,
    pub diagnostics: ResolveDiagnostics,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("'{column}' is not a dimension column of dataset '{dataset}'")]
    NotADimension { dataset: String, column: String },

    #[error("'{column}' is not a value column of dataset '{dataset}'")]
    NotAValueColumn { dataset: String, column: String },

    #[error("dataset '{dataset}' is single-value; a value column must be chosen")]
    MissingValueColumn { dataset: String },

    #[error("dataset '{dataset}' is hour-wide but no hourly columns are usable")]
    NoHourlyColumns { dataset: String },

    #[error("no rows matched the filters and date range")]
    EmptyResult,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run the full pipeline and return one authoritative point per date.
pub fn daily_series(
    store: &dyn DatasetStore,
    weights: &VersionWeights,
    query: &SeriesQuery,
) -> Result<DailySeries, QueryError> {
    let schema = store.schema();
    let dataset = schema.name.clone();

    // Configuration defects are rejected before any query is issued.
    for p in &query.filters {
        match schema.role(&p.column) {
            Some(ColumnRole::Dimension) => {}
            _ => {
                return Err(QueryError::NotADimension {
                    dataset: dataset.clone(),
                    column: p.column.clone(),
                })
            }
        }
    }
    let value_column = match schema.kind {
        DatasetKind::HourWide => {
            if schema.hourly_columns().is_empty() {
                return Err(QueryError::NoHourlyColumns { dataset });
            }
            None
        }
        DatasetKind::SingleValue => {
            let column = query
                .value_column
                .clone()
                .ok_or_else(|| QueryError::MissingValueColumn {
                    dataset: dataset.clone(),
                })?;
            match schema.role(&column) {
                Some(ColumnRole::Value) => Some(column),
                _ => {
                    return Err(QueryError::NotAValueColumn { dataset, column });
                }
            }
        }
    };

    let raw = store
        .fetch_records(&RecordRequest {
            constraints: query.filters.clone(),
            value_column,
        })
        .map_err(|e| match e {
            StoreError::NoHourlyColumns { dataset } => QueryError::NoHourlyColumns { dataset },
            other => QueryError::Store(other),
        })?;

    // Per-row date assembly; malformed rows are dropped, never raised.
    let mut diagnostics = ResolveDiagnostics::default();
    let mut records: Vec<ResolvedRecord> = Vec::with_capacity(raw.len());
    for rec in raw {
        match assemble_opt(rec.year, rec.day_code.as_deref()) {
            Some(date) if query.span.contains(date) => records.push(ResolvedRecord {
                date,
                dims: rec.dims,
                version: rec.version.unwrap_or_default(),
                hourly: rec.hourly,
                single: rec.single,
            }),
            Some(_) => {}
            None => diagnostics.dropped_dates += 1,
        }
    }
    if records.is_empty() {
        return Err(QueryError::EmptyResult);
    }

    let resolved = resolve_latest(records, weights, &mut diagnostics);

    let mut pairs: Vec<(NaiveDate, f64)> = Vec::with_capacity(resolved.len());
    match store.schema().kind {
        DatasetKind::HourWide => {
            for rec in &resolved {
                if let Some(pair) = reduce_hourly(rec, query.op, &mut diagnostics.skipped_cells) {
                    pairs.push(pair);
                }
            }
        }
        DatasetKind::SingleValue => {
            for rec in &resolved {
                match rec.single {
                    Some(v) => pairs.push((rec.date, v)),
                    None => diagnostics.skipped_cells += 1,
                }
            }
        }
    }
    if pairs.is_empty() {
        return Err(QueryError::EmptyResult);
    }

    Ok(DailySeries {
        points: aggregate_daily(pairs, query.op),
        diagnostics,
    })
}
