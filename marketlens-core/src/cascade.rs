//! Cascading filter resolution for the filter panel.
//!
//! One selection change triggers a full pass: every dimension's domain is
//! recomputed against the *other* selections (never its own), stale
//! selections are invalidated back to ALL, and a domain collapsing to a
//! single value auto-selects it. Auto-selection re-triggers propagation,
//! bounded so each column is auto-set at most once per external trigger.
//!
//! The caller owns serialization: the core provides no locking, so a second
//! pass must not run while one is in flight for the same selection instance.

use crate::store::{DatasetStore, Predicate, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The unconstrained sentinel shown at the head of every domain.
pub const ALL: &str = "ALL";

/// State of one dimension column's selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    /// Unconstrained.
    All,
    /// Value chosen by the user.
    User(String),
    /// Value chosen by the cascade because the domain collapsed to it.
    Auto(String),
}

impl SelectionState {
    /// The constraining value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            SelectionState::All => None,
            SelectionState::User(v) | SelectionState::Auto(v) => Some(v),
        }
    }
}

/// The session's partial selection over the dimension columns.
///
/// This is the sole session-scoped mutable state the core consumes; the UI
/// collaborator passes it in and receives it back mutated, replacing
/// scattered per-widget state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSelection {
    entries: BTreeMap<String, SelectionState>,
}

impl DimensionSelection {
    /// An unconstrained selection over the given dimension columns.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            entries: columns
                .iter()
                .map(|c| (c.to_string(), SelectionState::All))
                .collect(),
        }
    }

    /// Unconstrained selection over a schema's dimension columns.
    pub fn for_schema(schema: &crate::schema::DatasetSchema) -> Self {
        Self::new(&schema.dimension_columns())
    }

    pub fn get(&self, column: &str) -> Option<&SelectionState> {
        self.entries.get(column)
    }

    /// Record a user choice. Passing the ALL sentinel clears the column.
    pub fn set_user(&mut self, column: &str, value: &str) {
        let state = if value == ALL {
            SelectionState::All
        } else {
            SelectionState::User(value.to_string())
        };
        self.entries.insert(column.to_string(), state);
    }

    /// Reset a column to unconstrained.
    pub fn clear(&mut self, column: &str) {
        if let Some(state) = self.entries.get_mut(column) {
            *state = SelectionState::All;
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// Non-ALL entries as typed predicates, excluding `except`.
    fn constraints_excluding(&self, except: &str) -> Vec<Predicate> {
        self.entries
            .iter()
            .filter(|(c, _)| c.as_str() != except)
            .filter_map(|(c, s)| s.value().map(|v| Predicate::new(c.clone(), v)))
            .collect()
    }
}

/// Valid values for one dimension column: the ALL sentinel followed by the
/// distinct values consistent with the rest of the selection, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDomain {
    pub column: String,
    pub values: Vec<String>,
}

impl FilterDomain {
    fn new(column: &str, distinct: Vec<String>) -> Self {
        let mut values = Vec::with_capacity(distinct.len() + 1);
        values.push(ALL.to_string());
        values.extend(distinct);
        Self {
            column: column.to_string(),
            values,
        }
    }

    /// Whether a concrete (non-ALL) value is currently valid.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().skip(1).any(|v| v == value)
    }

    /// The single remaining value, when the domain has collapsed.
    fn sole_value(&self) -> Option<&str> {
        match self.values.len() {
            2 => Some(&self.values[1]),
            _ => None,
        }
    }
}

/// Atomic result of one cascade trigger: the full domain map plus the
/// columns whose selection the pass changed. The collaborator re-renders
/// once per trigger from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeResult {
    pub domains: BTreeMap<String, FilterDomain>,
    pub changed: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("'{column}' is not a dimension column of dataset '{dataset}'")]
    NotADimension { dataset: String, column: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run one full cascade pass over the selection.
///
/// `changed` names the column whose selection externally triggered the
/// pass. Columns are recomputed in schema order with the changed column
/// moved last, so when two selections are mutually unsatisfiable the most
/// recent choice survives and the stale one is invalidated.
///
/// Guarantee on return: every non-ALL selected value is a member of its own
/// recomputed domain, i.e. the displayed selection is jointly satisfiable.
pub fn resolve_cascade(
    store: &dyn DatasetStore,
    selection: &mut DimensionSelection,
    changed_column: Option<&str>,
) -> Result<CascadeResult, CascadeError> {
    let schema = store.schema();
    let mut dimension_columns: Vec<String> = schema
        .dimension_columns()
        .iter()
        .map(|c| c.to_string())
        .collect();
    for column in selection.columns() {
        if !dimension_columns.iter().any(|c| c == column) {
            return Err(CascadeError::NotADimension {
                dataset: schema.name.clone(),
                column: column.to_string(),
            });
        }
    }
    if let Some(trigger) = changed_column {
        if let Some(pos) = dimension_columns.iter().position(|c| c == trigger) {
            let c = dimension_columns.remove(pos);
            dimension_columns.push(c);
        }
    }

    let mut auto_visited: BTreeSet<String> = BTreeSet::new();
    let mut changed: Vec<String> = Vec::new();

    // Each pass recomputes every domain against the current selection.
    // A pass that changes nothing is the fixed point; its domains are the
    // ones returned. Termination: auto-select touches each column at most
    // once, and invalidation only ever moves a column to All.
    loop {
        let mut domains: BTreeMap<String, FilterDomain> = BTreeMap::new();
        let mut any_change = false;

        for column in &dimension_columns {
            let constraints = selection.constraints_excluding(column);
            let distinct = store.distinct_values(column, &constraints)?;
            let domain = FilterDomain::new(column, distinct);

            let current = selection.get(column).cloned().unwrap_or(SelectionState::All);
            match &current {
                // A stale user choice that left its domain resets to ALL
                // rather than staying displayed as an impossible value.
                SelectionState::User(value) if !domain.contains(value) => {
                    selection.clear(column);
                    note_change(&mut changed, column);
                    any_change = true;
                }
                // An auto choice is provisional: it only stands while the
                // domain still collapses to exactly that value.
                SelectionState::Auto(value) if domain.sole_value() != Some(value.as_str()) => {
                    selection.clear(column);
                    note_change(&mut changed, column);
                    any_change = true;
                }
                _ => {}
            }

            if let Some(sole) = domain.sole_value() {
                let already = selection.get(column).and_then(|s| s.value()) == Some(sole);
                if !already && !auto_visited.contains(column) {
                    auto_visited.insert(column.clone());
                    selection
                        .entries
                        .insert(column.clone(), SelectionState::Auto(sole.to_string()));
                    note_change(&mut changed, column);
                    any_change = true;
                }
            }

            domains.insert(column.clone(), domain);
        }

        if !any_change {
            return Ok(CascadeResult { domains, changed });
        }
    }
}

fn note_change(changed: &mut Vec<String>, column: &str) {
    if !changed.iter().any(|c| c == column) {
        changed.push(column.to_string());
    }
}
