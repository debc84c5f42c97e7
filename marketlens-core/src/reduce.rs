//! Reduction operators and the horizontal (intraday) reducer.
//!
//! A reduction operator collapses a set of numeric cells into one scalar.
//! The same operator type serves both directions: horizontally across a
//! row's 24 hourly cells, and vertically across rows sharing a date
//! (see `aggregate`).

use crate::version::ResolvedRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reduction operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    Mean,
    Sum,
    Max,
    Min,
}

impl Default for ReduceOp {
    fn default() -> Self {
        ReduceOp::Mean
    }
}

impl ReduceOp {
    /// Apply the operator over a slice of valid cells.
    ///
    /// Returns `None` for an empty slice — a row or date with no valid
    /// cells yields no point rather than a fabricated zero.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            ReduceOp::Mean => values.iter().sum::<f64>() / values.len() as f64,
            ReduceOp::Sum => values.iter().sum(),
            ReduceOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ReduceOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReduceOp::Mean => "mean",
            ReduceOp::Sum => "sum",
            ReduceOp::Max => "max",
            ReduceOp::Min => "min",
        };
        f.write_str(s)
    }
}

impl FromStr for ReduceOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" => Ok(ReduceOp::Mean),
            "sum" => Ok(ReduceOp::Sum),
            "max" => Ok(ReduceOp::Max),
            "min" => Ok(ReduceOp::Min),
            other => Err(format!("unknown reduction operator '{other}'")),
        }
    }
}

/// Collapse one hour-wide record's hourly cells into a daily scalar.
///
/// Missing and non-numeric cells are excluded from the reduction — for
/// `mean` they leave both numerator and divisor. `skipped` counts the
/// excluded cells. A row with no valid cells yields no point.
pub fn reduce_hourly(
    record: &ResolvedRecord,
    op: ReduceOp,
    skipped: &mut usize,
) -> Option<(NaiveDate, f64)> {
    let valid: Vec<f64> = record.hourly.iter().filter_map(|c| *c).collect();
    *skipped += record.hourly.len() - valid.len();
    op.apply(&valid).map(|v| (record.date, v))
}
