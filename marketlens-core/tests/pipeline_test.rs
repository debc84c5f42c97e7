//! End-to-end pipeline tests over a Polars-backed store.
//!
//! Covers:
//! 1. Version precedence: txr beats tx1, txf beats both
//! 2. Horizontal mean excluding non-numeric hourly cells
//! 3. Malformed dates dropped without aborting the query
//! 4. Query-shape and configuration defects as distinct errors
//! 5. Ambiguity falling through to the aggregation operator

use chrono::NaiveDate;
use marketlens_core::frame::FrameStore;
use marketlens_core::query::{daily_series, DateSpan, QueryError, SeriesQuery};
use marketlens_core::reduce::ReduceOp;
use marketlens_core::schema::TechnicalFields;
use marketlens_core::store::Predicate;
use marketlens_core::version::VersionWeights;
use polars::prelude::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Hour-wide frame builder: one row per entry, hourly cells all `fill`
/// except hour 1 which takes `h1` (as text, to exercise coercion).
fn hour_wide_frame(rows: &[(i64, i64, &str, &str, &str, f64)]) -> DataFrame {
    let mut columns = vec![
        Column::new("year".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
        Column::new("mmdd".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
        Column::new(
            "version".into(),
            rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        ),
        Column::new("region".into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()),
        Column::new("h1".into(), rows.iter().map(|r| r.4).collect::<Vec<_>>()),
    ];
    for h in 2..=24 {
        columns.push(Column::new(
            format!("h{h}").into(),
            rows.iter().map(|r| r.5).collect::<Vec<_>>(),
        ));
    }
    DataFrame::new(columns).unwrap()
}

fn store(df: DataFrame) -> FrameStore {
    FrameStore::new("prices", df, &TechnicalFields::default())
}

#[test]
fn version_precedence_end_to_end() {
    // Same (date, region): tx1 and txr compete; txr must win.
    let df = hour_wide_frame(&[
        (2025, 115, "tx1", "North", "1.0", 1.0),
        (2025, 115, "txr", "North", "3.0", 3.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].date, d(2025, 1, 15));
    assert_eq!(series.points[0].value, 3.0);
    assert_eq!(series.diagnostics.ambiguous_groups, 0);

    // Adding a txf row (weight 10) makes it win over both.
    let df = hour_wide_frame(&[
        (2025, 115, "tx1", "North", "1.0", 1.0),
        (2025, 115, "txr", "North", "3.0", 3.0),
        (2025, 115, "txf", "North", "7.0", 7.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(series.points[0].value, 7.0);
}

#[test]
fn mean_excludes_non_numeric_hourly_cells() {
    // h1 holds "x": coerced to null, excluded from numerator and divisor.
    let df = hour_wide_frame(&[(2025, 115, "txf", "North", "x", 10.0)]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    // 23 valid cells of 10.0, invalid cell skipped.
    assert_eq!(series.points[0].value, 10.0);
    assert_eq!(series.diagnostics.skipped_cells, 1);
}

#[test]
fn malformed_dates_drop_rows_silently() {
    // Feb 29 in a non-leap year is unparseable; the other row survives.
    let df = hour_wide_frame(&[
        (2023, 229, "txf", "North", "1.0", 1.0),
        (2023, 301, "txf", "North", "2.0", 2.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].date, d(2023, 3, 1));
    assert_eq!(series.diagnostics.dropped_dates, 1);
}

#[test]
fn date_span_restricts_the_series() {
    let df = hour_wide_frame(&[
        (2025, 110, "txf", "North", "1.0", 1.0),
        (2025, 115, "txf", "North", "2.0", 2.0),
        (2025, 120, "txf", "North", "3.0", 3.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            span: DateSpan {
                start: Some(d(2025, 1, 12)),
                end: Some(d(2025, 1, 17)),
            },
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].date, d(2025, 1, 15));
}

#[test]
fn dimension_filters_restrict_rows() {
    let df = hour_wide_frame(&[
        (2025, 115, "txf", "North", "1.0", 1.0),
        (2025, 115, "txf", "South", "9.0", 9.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            filters: vec![Predicate::new("region", "South")],
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].value, 9.0);
}

#[test]
fn ambiguous_versions_fall_through_to_the_operator() {
    // Two identical txf rows for one (date, region): both survive and the
    // aggregation operator combines them.
    let df = hour_wide_frame(&[
        (2025, 115, "txf", "North", "2.0", 2.0),
        (2025, 115, "txf", "North", "4.0", 4.0),
    ]);
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Mean,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(series.diagnostics.ambiguous_groups, 1);
    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].value, 3.0);
}

#[test]
fn single_value_dataset_uses_the_chosen_value_column() {
    let df = df!(
        "year" => &[2025i64, 2025, 2025],
        "mmdd" => &[115i64, 115, 116],
        "version" => &["txf", "txf", "txf"],
        "region" => &["North", "South", "North"],
        "value" => &[5.0f64, 7.0, 10.0],
    )
    .unwrap();
    let series = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            op: ReduceOp::Sum,
            value_column: Some("value".into()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(
        series.points.iter().map(|p| p.value).collect::<Vec<_>>(),
        vec![12.0, 10.0]
    );
}

#[test]
fn single_value_dataset_requires_a_value_column() {
    let df = df!(
        "year" => &[2025i64],
        "mmdd" => &[115i64],
        "version" => &["txf"],
        "region" => &["North"],
        "value" => &[5.0f64],
    )
    .unwrap();
    let err = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery::default(),
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::MissingValueColumn { .. }));
}

#[test]
fn unknown_filter_column_is_a_configuration_defect() {
    let df = hour_wide_frame(&[(2025, 115, "txf", "North", "1.0", 1.0)]);
    let err = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            filters: vec![Predicate::new("nope", "x")],
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::NotADimension { .. }));

    // Technical columns are not filter candidates either.
    let df = hour_wide_frame(&[(2025, 115, "txf", "North", "1.0", 1.0)]);
    let err = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            filters: vec![Predicate::new("version", "txf")],
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::NotADimension { .. }));
}

#[test]
fn empty_result_is_an_explicit_signal() {
    let df = hour_wide_frame(&[(2025, 115, "txf", "North", "1.0", 1.0)]);
    let err = daily_series(
        &store(df),
        &VersionWeights::default(),
        &SeriesQuery {
            filters: vec![Predicate::new("region", "Atlantis")],
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, QueryError::EmptyResult));
}
