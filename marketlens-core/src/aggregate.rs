//! Temporal aggregation — one point per distinct date, sorted ascending.
//!
//! Input rows sharing a date are combined with the query's reduction
//! operator. That deliberately includes rows left over from an unresolved
//! version tie: ambiguity from the resolver falls through to the same
//! operator rather than getting a separate rule.

use crate::reduce::ReduceOp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One point of the output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Group (date, scalar) pairs by date and reduce each group.
pub fn aggregate_daily(points: Vec<(NaiveDate, f64)>, op: ReduceOp) -> Vec<SeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (date, value) in points {
        by_date.entry(date).or_default().push(value);
    }

    by_date
        .into_iter()
        .filter_map(|(date, values)| op.apply(&values).map(|value| SeriesPoint { date, value }))
        .collect()
}
