//! Protocol table builder and selection.
//!
//! The upstream schema is not stable, so the table never assumes an optional
//! column exists: it keeps the preferred columns that appear as a key in at
//! least one row, in preferred order. Presence is decided once for the whole
//! input, not per row.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use compare_common::types::ProtocolSummary;

/// Order of rows after filtering by selected names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOrder {
    /// Rows follow the order in which names were selected.
    #[default]
    Selection,
    /// Rows keep their position in the fetched list (membership filter).
    Source,
}

impl std::fmt::Display for SelectionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionOrder::Selection => write!(f, "selection"),
            SelectionOrder::Source => write!(f, "source"),
        }
    }
}

impl std::str::FromStr for SelectionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "selection" => Ok(SelectionOrder::Selection),
            "source" => Ok(SelectionOrder::Source),
            other => Err(format!("Invalid selection order: {other}. Use: selection, source")),
        }
    }
}

/// One row of a `ProtocolTable`; one cell per table column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Option<Value>>,
}

/// Protocol rows restricted to the preferred columns actually present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProtocolTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl ProtocolTable {
    pub fn build<S: AsRef<str>>(protocols: &[ProtocolSummary], preferred: &[S]) -> Self {
        let columns: Vec<String> = preferred
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|col| protocols.iter().any(|p| p.has_key(col)))
            .map(str::to_string)
            .collect();

        let rows = protocols
            .iter()
            .map(|p| TableRow {
                cells: columns.iter().map(|col| p.get(col).cloned()).collect(),
            })
            .collect();

        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name); `None` when the column or value is absent.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.cells.get(idx)?.as_ref()
    }
}

/// Requested names split by whether the fetched list knows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSelection {
    /// Canonical protocol names, in request order, without duplicates.
    pub known: Vec<String>,
    pub unknown: Vec<String>,
}

/// Row matching `requested` by exact name, or failing that by exact slug.
pub fn find_protocol<'a>(
    protocols: &'a [ProtocolSummary],
    requested: &str,
) -> Option<&'a ProtocolSummary> {
    protocols
        .iter()
        .find(|p| p.name() == Some(requested))
        .or_else(|| protocols.iter().find(|p| p.slug() == Some(requested)))
}

/// Match each requested value against the list, by exact name first and
/// then by exact slug. Duplicates are dropped after the first occurrence.
pub fn resolve_selection<S: AsRef<str>>(
    protocols: &[ProtocolSummary],
    requested: &[S],
) -> ResolvedSelection {
    let mut resolved = ResolvedSelection::default();
    let mut seen = HashSet::new();

    for req in requested.iter().map(AsRef::<str>::as_ref) {
        let hit = find_protocol(protocols, req).and_then(ProtocolSummary::name);

        match hit {
            Some(name) => {
                if seen.insert(name.to_string()) {
                    resolved.known.push(name.to_string());
                }
            }
            None => resolved.unknown.push(req.to_string()),
        }
    }
    resolved
}

/// First `n` protocol names in list order.
pub fn default_selection(protocols: &[ProtocolSummary], n: usize) -> Vec<String> {
    protocols
        .iter()
        .filter_map(ProtocolSummary::name)
        .take(n)
        .map(str::to_string)
        .collect()
}

/// Rows whose name is selected. Every row sharing a selected name is kept.
pub fn select_protocols<S: AsRef<str>>(
    protocols: &[ProtocolSummary],
    names: &[S],
    order: SelectionOrder,
) -> Vec<ProtocolSummary> {
    match order {
        SelectionOrder::Source => {
            let wanted: HashSet<&str> = names.iter().map(AsRef::<str>::as_ref).collect();
            protocols
                .iter()
                .filter(|p| p.name().is_some_and(|n| wanted.contains(n)))
                .cloned()
                .collect()
        }
        SelectionOrder::Selection => {
            let mut seen = HashSet::new();
            names
                .iter()
                .map(AsRef::<str>::as_ref)
                .filter(|name| seen.insert(*name))
                .flat_map(|name| protocols.iter().filter(move |p| p.name() == Some(name)))
                .cloned()
                .collect()
        }
    }
}
