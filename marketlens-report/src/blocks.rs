//! Report blocks: one independently filtered daily series per block.
//!
//! A block whose query matches nothing is kept, flagged empty, and labeled
//! — one dry filter combination must not abort the rest of the report.

use marketlens_core::query::{daily_series, DateSpan, QueryError, SeriesQuery};
use marketlens_core::store::{DatasetStore, Predicate};
use marketlens_core::version::{ResolveDiagnostics, VersionWeights};
use marketlens_core::aggregate::SeriesPoint;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::ReportError;

/// One built block, ready for layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBlock {
    pub label: String,
    /// Human-readable description of the applied filter, e.g.
    /// `region=North, resource=Solar1` or `unfiltered`.
    pub filter_note: String,
    pub points: Vec<SeriesPoint>,
    pub diagnostics: ResolveDiagnostics,
    /// True when the block's query matched nothing.
    pub empty: bool,
}

/// Build every block of the report against one shared store snapshot.
pub fn build_report(
    store: &dyn DatasetStore,
    weights: &VersionWeights,
    config: &ReportConfig,
) -> Result<Vec<ReportBlock>, ReportError> {
    let span = DateSpan {
        start: config.start,
        end: config.end,
    };

    let mut blocks = Vec::with_capacity(config.blocks.len());
    for block in &config.blocks {
        let filters: Vec<Predicate> = block
            .filters
            .iter()
            .map(|(c, v)| Predicate::new(c.clone(), v.clone()))
            .collect();
        let filter_note = if filters.is_empty() {
            "unfiltered".to_string()
        } else {
            filters
                .iter()
                .map(|p| format!("{}={}", p.column, p.value))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let query = SeriesQuery {
            filters,
            span,
            op: config.op,
            value_column: config.value_column.clone(),
        };
        match daily_series(store, weights, &query) {
            Ok(series) => blocks.push(ReportBlock {
                label: block.label.clone(),
                filter_note,
                points: series.points,
                diagnostics: series.diagnostics,
                empty: false,
            }),
            // A dry block is a result, not a failure of the report.
            Err(QueryError::EmptyResult) => blocks.push(ReportBlock {
                label: block.label.clone(),
                filter_note,
                points: Vec::new(),
                diagnostics: ResolveDiagnostics::default(),
                empty: true,
            }),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(blocks)
}
