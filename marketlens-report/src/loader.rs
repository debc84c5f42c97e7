//! Table loading: open a CSV or Parquet file as a classified store.
//!
//! The file extension picks the reader; the frame is materialized once and
//! served as a read snapshot for the whole session.

use marketlens_core::frame::FrameStore;
use marketlens_core::schema::TechnicalFields;
use polars::prelude::*;
use std::fs;
use std::path::Path;

use crate::ReportError;

/// Open a dataset file and classify its columns.
pub fn open_store(
    path: &Path,
    name: Option<&str>,
    technical: &TechnicalFields,
) -> Result<FrameStore, ReportError> {
    let frame = read_frame(path)?;
    let name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string()),
    };
    Ok(FrameStore::new(name, frame, technical))
}

fn read_frame(path: &Path) -> Result<DataFrame, ReportError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| ReportError::Load(format!("read csv '{}': {e}", path.display()))),
        "parquet" => {
            let file = fs::File::open(path)
                .map_err(|e| ReportError::Load(format!("open '{}': {e}", path.display())))?;
            ParquetReader::new(file)
                .finish()
                .map_err(|e| ReportError::Load(format!("read parquet '{}': {e}", path.display())))
        }
        other => Err(ReportError::Load(format!(
            "unsupported dataset file type '.{other}' (expected .csv or .parquet)"
        ))),
    }
}
