//! CSV export of series and side-by-side report blocks.
//!
//! Block layout: each block contributes a `date` column and a value column
//! headed by the block's label, rows aligned on the union of dates with
//! blanks where a block has no point. A second header row carries each
//! block's filter note.

use marketlens_core::aggregate::SeriesPoint;
use std::collections::BTreeSet;
use std::path::Path;

use crate::blocks::ReportBlock;
use crate::ReportError;

/// Write one series as a two-column CSV.
pub fn write_series_csv(path: &Path, points: &[SeriesPoint]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "value"])?;
    for p in points {
        writer.write_record([p.date.to_string(), format_value(p.value)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write report blocks side by side, aligned on the union of dates.
pub fn write_report_csv(path: &Path, blocks: &[ReportBlock]) -> Result<(), ReportError> {
    if blocks.is_empty() {
        return Err(ReportError::Config("no blocks to export".into()));
    }
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(blocks.len() * 2);
    let mut notes = Vec::with_capacity(blocks.len() * 2);
    for block in blocks {
        header.push("date".to_string());
        header.push(block.label.clone());
        notes.push(String::new());
        notes.push(if block.empty {
            format!("{} (no data)", block.filter_note)
        } else {
            block.filter_note.clone()
        });
    }
    writer.write_record(&header)?;
    writer.write_record(&notes)?;

    let dates: BTreeSet<_> = blocks
        .iter()
        .flat_map(|b| b.points.iter().map(|p| p.date))
        .collect();

    for date in dates {
        let mut row = Vec::with_capacity(blocks.len() * 2);
        for block in blocks {
            match block.points.iter().find(|p| p.date == date) {
                Some(p) => {
                    row.push(date.to_string());
                    row.push(format_value(p.value));
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_value(v: f64) -> String {
    // Trim trailing zeros but keep full precision for fractional values.
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
