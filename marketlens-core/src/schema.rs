//! Schema classification — the column taxonomy every other component reads.
//!
//! A dataset's columns are partitioned into four disjoint roles:
//! - Technical: bookkeeping columns (row index, year, month-day code, load
//!   date, identifier, version) that are never filter candidates
//! - Hourly: the intraday value spread (column `"0"`..`"23"` or `h1`..`h24`)
//! - Dimension: categorical filter/classifier candidates
//! - Value: scalar value candidates in single-value datasets
//!
//! Classification is a pure function of the ordered column-name list. It runs
//! once when a table is first opened and the result is immutable until the
//! underlying column set changes.

use serde::{Deserialize, Serialize};

/// Role of a single column in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Bookkeeping column, never a filter candidate.
    Technical,
    /// Categorical filter/classifier candidate.
    Dimension,
    /// One of the 24 intraday columns; carries the hour it represents.
    Hourly(u8),
    /// Scalar value candidate (single-value datasets only).
    Value,
}

/// Shape of a dataset: one value spread across 24 hourly columns, or one
/// scalar value column per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    HourWide,
    SingleValue,
}

/// Names of the six fixed technical columns.
///
/// The defaults match the upstream table layout; deployments with different
/// column names override them via configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalFields {
    pub row_index: String,
    pub year: String,
    pub day_code: String,
    pub load_date: String,
    pub identifier: String,
    pub version: String,
}

impl Default for TechnicalFields {
    fn default() -> Self {
        Self {
            row_index: "rowid".into(),
            year: "year".into(),
            day_code: "mmdd".into(),
            load_date: "loaddate".into(),
            identifier: "id".into(),
            version: "version".into(),
        }
    }
}

impl TechnicalFields {
    fn contains(&self, name: &str) -> bool {
        let n = name.trim();
        n.eq_ignore_ascii_case(&self.row_index)
            || n.eq_ignore_ascii_case(&self.year)
            || n.eq_ignore_ascii_case(&self.day_code)
            || n.eq_ignore_ascii_case(&self.load_date)
            || n.eq_ignore_ascii_case(&self.identifier)
            || n.eq_ignore_ascii_case(&self.version)
    }
}

/// Column names that mark a scalar value column in single-value datasets.
const VALUE_NAMES: &[&str] = &["value", "amount", "total", "price", "mw", "mwh", "avg"];

/// Classified schema of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub name: String,
    columns: Vec<String>,
    roles: Vec<ColumnRole>,
    pub kind: DatasetKind,
    pub technical: TechnicalFields,
}

impl DatasetSchema {
    /// Classify an ordered column list into the four roles.
    ///
    /// An empty column list yields an empty (single-value) classification,
    /// not an error.
    pub fn classify(
        name: impl Into<String>,
        columns: &[impl AsRef<str>],
        technical: &TechnicalFields,
    ) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let roles: Vec<ColumnRole> = columns
            .iter()
            .map(|c| {
                if technical.contains(c) {
                    ColumnRole::Technical
                } else if let Some(h) = hour_of(c) {
                    ColumnRole::Hourly(h)
                } else if is_value_name(c) {
                    ColumnRole::Value
                } else {
                    ColumnRole::Dimension
                }
            })
            .collect();

        let hourly = roles
            .iter()
            .filter(|r| matches!(r, ColumnRole::Hourly(_)))
            .count();
        let kind = if hourly >= 24 {
            DatasetKind::HourWide
        } else {
            DatasetKind::SingleValue
        };

        Self {
            name: name.into(),
            columns,
            roles,
            kind,
            technical: technical.clone(),
        }
    }

    /// Ordered column list as classified.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Role of a named column, if the column exists.
    pub fn role(&self, column: &str) -> Option<ColumnRole> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.roles[i])
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_hour_wide(&self) -> bool {
        self.kind == DatasetKind::HourWide
    }

    /// Dimension columns in schema order.
    pub fn dimension_columns(&self) -> Vec<&str> {
        self.by_role(|r| matches!(r, ColumnRole::Dimension))
    }

    /// Hourly columns ordered by the hour they represent.
    pub fn hourly_columns(&self) -> Vec<(&str, u8)> {
        let mut cols: Vec<(&str, u8)> = self
            .columns
            .iter()
            .zip(&self.roles)
            .filter_map(|(c, r)| match r {
                ColumnRole::Hourly(h) => Some((c.as_str(), *h)),
                _ => None,
            })
            .collect();
        cols.sort_by_key(|(_, h)| *h);
        cols
    }

    /// Value-column candidates (meaningful for single-value datasets).
    pub fn value_columns(&self) -> Vec<&str> {
        self.by_role(|r| matches!(r, ColumnRole::Value))
    }

    fn by_role(&self, pred: impl Fn(&ColumnRole) -> bool) -> Vec<&str> {
        self.columns
            .iter()
            .zip(&self.roles)
            .filter(|(_, r)| pred(r))
            .map(|(c, _)| c.as_str())
            .collect()
    }
}

fn is_value_name(name: &str) -> bool {
    VALUE_NAMES
        .iter()
        .any(|v| name.trim().eq_ignore_ascii_case(v))
}

/// Recognize an hourly column name and return the hour it carries.
///
/// Purely numeric names must fall in [0, 23]. Prefixed names (`h`, `hr`,
/// `hour`, `he`, optionally followed by `_` or a space) accept [0, 24] to
/// cover hour-ending conventions.
fn hour_of(name: &str) -> Option<u8> {
    let n = name.trim();
    if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
        let h: u32 = n.parse().ok()?;
        return if h <= 23 { Some(h as u8) } else { None };
    }

    let lower = n.to_ascii_lowercase();
    for prefix in ["hour", "hr", "he", "h"] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            let rest = rest.trim_start_matches(['_', ' ']);
            if !rest.is_empty() && rest.len() <= 2 && rest.bytes().all(|b| b.is_ascii_digit()) {
                let h: u32 = rest.parse().ok()?;
                if h <= 24 {
                    return Some(h as u8);
                }
            }
            // A matching prefix with a non-numeric tail is not hour-like
            // (e.g. "heat"), so keep trying shorter prefixes.
        }
    }
    None
}
