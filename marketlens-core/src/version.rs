//! Version resolution — pick the authoritative revision per logical record.
//!
//! A logical record is identified by (canonical date, dimension tuple).
//! Competing revisions carry a short version tag; tags map to integer
//! weights through a fixed table plus a numeric-suffix fallback rule, and
//! the highest weight wins. Equal-weight survivors spanning more than one
//! tag are tie-broken by lexicographically greatest tag; if several rows of
//! the winning tag remain the group is counted ambiguous and all survivors
//! pass through to the aggregator, which combines them with the query's
//! reduction operator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version-tag weight table.
///
/// Exact-match entries are consulted first, then the suffix rule
/// `tx<N>` ⇒ `10 + N` for `N > 2`. Unrecognized tags weigh 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionWeights {
    pub exact: BTreeMap<String, i64>,
}

impl Default for VersionWeights {
    fn default() -> Self {
        let exact = [
            ("txf", 10),
            ("txa", 10),
            ("txr", 3),
            ("tx1", 1),
            ("tx2", 2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { exact }
    }
}

impl VersionWeights {
    /// Load an override table from TOML (`[exact]` map of tag → weight).
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Weight of a version tag. Missing tags weigh 0.
    pub fn weight(&self, tag: &str) -> i64 {
        let tag = tag.trim();
        if let Some(w) = self.exact.get(tag) {
            return *w;
        }
        suffix_weight(tag).unwrap_or(0)
    }
}

/// The `tx<N>` ⇒ `10 + N` fallback, for `N > 2`.
fn suffix_weight(tag: &str) -> Option<i64> {
    let rest = tag.strip_prefix("tx")?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = rest.parse().ok()?;
    if n > 2 {
        Some(10 + n)
    } else {
        None
    }
}

/// A row promoted with its assembled canonical date.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub date: NaiveDate,
    /// Dimension values in schema order; part of the record's identity.
    pub dims: Vec<(String, String)>,
    pub version: String,
    pub hourly: Vec<Option<f64>>,
    pub single: Option<f64>,
}

/// Counters surfaced alongside a query result for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveDiagnostics {
    /// Distinct (date, dimension-tuple) groups seen by the resolver.
    pub total_groups: usize,
    /// Groups where more than one row survived resolution.
    pub ambiguous_groups: usize,
    /// Rows dropped for an unparseable or missing date.
    pub dropped_dates: usize,
    /// Hourly or value cells excluded as missing/non-numeric.
    pub skipped_cells: usize,
}

/// Keep only the weight-maximal revision(s) per (date, dimension-tuple).
///
/// Ties across different tags resolve to the lexicographically greatest tag.
/// Output is sorted by (date, dims, version) so resolution is deterministic
/// and idempotent.
pub fn resolve_latest(
    records: Vec<ResolvedRecord>,
    weights: &VersionWeights,
    diagnostics: &mut ResolveDiagnostics,
) -> Vec<ResolvedRecord> {
    let mut groups: BTreeMap<(NaiveDate, Vec<(String, String)>), Vec<ResolvedRecord>> =
        BTreeMap::new();
    for rec in records {
        groups
            .entry((rec.date, rec.dims.clone()))
            .or_default()
            .push(rec);
    }

    let mut out = Vec::new();
    for (_, group) in groups {
        diagnostics.total_groups += 1;

        let max_weight = group
            .iter()
            .map(|r| weights.weight(&r.version))
            .max()
            .unwrap_or(0);
        let mut survivors: Vec<ResolvedRecord> = group
            .into_iter()
            .filter(|r| weights.weight(&r.version) == max_weight)
            .collect();

        // Equal weight across different tag families: greatest tag wins.
        if let Some(best_tag) = survivors.iter().map(|r| r.version.clone()).max() {
            survivors.retain(|r| r.version == best_tag);
        }

        if survivors.len() > 1 {
            diagnostics.ambiguous_groups += 1;
        }
        out.extend(survivors);
    }

    out.sort_by(|a, b| {
        (a.date, &a.dims, &a.version).cmp(&(b.date, &b.dims, &b.version))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: (i32, u32, u32), dims: &[(&str, &str)], version: &str, v: f64) -> ResolvedRecord {
        ResolvedRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            dims: dims
                .iter()
                .map(|(c, x)| (c.to_string(), x.to_string()))
                .collect(),
            version: version.to_string(),
            hourly: Vec::new(),
            single: Some(v),
        }
    }

    #[test]
    fn weight_table_defaults() {
        let w = VersionWeights::default();
        assert_eq!(w.weight("txf"), 10);
        assert_eq!(w.weight("txa"), 10);
        assert_eq!(w.weight("txr"), 3);
        assert_eq!(w.weight("tx1"), 1);
        assert_eq!(w.weight("tx2"), 2);
        // suffix rule kicks in above 2
        assert_eq!(w.weight("tx3"), 13);
        assert_eq!(w.weight("tx11"), 21);
        // unrecognized
        assert_eq!(w.weight("zz9"), 0);
        assert_eq!(w.weight(""), 0);
        assert_eq!(w.weight("txx"), 0);
    }

    #[test]
    fn toml_override_replaces_exact_entries() {
        let w = VersionWeights::from_toml("[exact]\nfin = 99\ntxr = 1\n").unwrap();
        assert_eq!(w.weight("fin"), 99);
        assert_eq!(w.weight("txr"), 1);
        // suffix fallback still applies
        assert_eq!(w.weight("tx5"), 15);
    }

    #[test]
    fn highest_weight_wins_per_group() {
        let records = vec![
            rec((2025, 1, 15), &[("region", "North")], "tx1", 1.0),
            rec((2025, 1, 15), &[("region", "North")], "txr", 2.0),
            rec((2025, 1, 15), &[("region", "North")], "txf", 3.0),
        ];
        let mut diag = ResolveDiagnostics::default();
        let out = resolve_latest(records, &VersionWeights::default(), &mut diag);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].version, "txf");
        assert_eq!(diag.total_groups, 1);
        assert_eq!(diag.ambiguous_groups, 0);
    }

    #[test]
    fn groups_are_independent() {
        let records = vec![
            rec((2025, 1, 15), &[("region", "North")], "tx1", 1.0),
            rec((2025, 1, 15), &[("region", "South")], "txr", 2.0),
            rec((2025, 1, 16), &[("region", "North")], "tx1", 3.0),
        ];
        let mut diag = ResolveDiagnostics::default();
        let out = resolve_latest(records, &VersionWeights::default(), &mut diag);
        assert_eq!(out.len(), 3);
        assert_eq!(diag.total_groups, 3);
    }

    #[test]
    fn equal_weight_tags_tie_break_lexically() {
        // txf and txa both weigh 10; greatest tag (txf) wins.
        let records = vec![
            rec((2025, 1, 15), &[("region", "North")], "txa", 1.0),
            rec((2025, 1, 15), &[("region", "North")], "txf", 2.0),
        ];
        let mut diag = ResolveDiagnostics::default();
        let out = resolve_latest(records, &VersionWeights::default(), &mut diag);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].version, "txf");
        assert_eq!(diag.ambiguous_groups, 0);
    }

    #[test]
    fn duplicate_rows_of_winning_tag_are_ambiguous() {
        let records = vec![
            rec((2025, 1, 15), &[("region", "North")], "txf", 1.0),
            rec((2025, 1, 15), &[("region", "North")], "txf", 2.0),
        ];
        let mut diag = ResolveDiagnostics::default();
        let out = resolve_latest(records, &VersionWeights::default(), &mut diag);
        assert_eq!(out.len(), 2);
        assert_eq!(diag.ambiguous_groups, 1);
    }

    #[test]
    fn resolution_is_idempotent() {
        let records = vec![
            rec((2025, 1, 15), &[("region", "North")], "tx1", 1.0),
            rec((2025, 1, 15), &[("region", "North")], "txr", 2.0),
            rec((2025, 1, 16), &[("region", "North")], "txf", 3.0),
        ];
        let weights = VersionWeights::default();
        let mut d1 = ResolveDiagnostics::default();
        let once = resolve_latest(records, &weights, &mut d1);
        let mut d2 = ResolveDiagnostics::default();
        let twice = resolve_latest(once.clone(), &weights, &mut d2);
        assert_eq!(once, twice);
    }
}
