//! Field normalizer for the protocol detail view.
//!
//! Each raw field is classified into a `FieldValue` and rendered by a total
//! match over its variants, so a new upstream field shape lands in `Other`
//! instead of being silently mis-rendered.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fmt::format_json_number;

/// Shape of one raw field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Null or the empty string; never displayed.
    Missing,
    Number(serde_json::Number),
    Text(String),
    /// Elements already converted to strings.
    List(Vec<String>),
    /// Sub-key / sub-value pairs, values already converted to strings.
    Mapping(Vec<(String, String)>),
    /// Any other shape, converted verbatim.
    Other(String),
}

impl FieldValue {
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::String(s) if s.is_empty() => FieldValue::Missing,
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => FieldValue::Number(n.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(stringify).collect()),
            Value::Object(map) => FieldValue::Mapping(
                map.iter().map(|(k, v)| (k.clone(), stringify(v))).collect(),
            ),
            Value::Bool(b) => FieldValue::Other(b.to_string()),
        }
    }
}

/// One display entry of the detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldEntry {
    /// `label: value` on one line.
    Line { label: String, value: String },
    /// A labelled group with one `sub_key: sub_value` line per sub-key.
    Group { label: String, lines: Vec<(String, String)> },
}

impl FieldEntry {
    pub fn label(&self) -> &str {
        match self {
            FieldEntry::Line { label, .. } | FieldEntry::Group { label, .. } => label,
        }
    }
}

/// Display entries for every field of `record` except skipped keys and
/// missing values, in record order.
pub fn normalize_fields<S: AsRef<str>>(record: &Map<String, Value>, skip: &[S]) -> Vec<FieldEntry> {
    let skip: HashSet<&str> = skip.iter().map(AsRef::<str>::as_ref).collect();

    record
        .iter()
        .filter(|(key, _)| !skip.contains(key.as_str()))
        .filter_map(|(key, value)| render_field(key, &FieldValue::classify(value)))
        .collect()
}

/// Render one classified field; `None` for `Missing`.
pub fn render_field(key: &str, value: &FieldValue) -> Option<FieldEntry> {
    let label = label_for(key);
    let line = |value: String| Some(FieldEntry::Line { label: label.clone(), value });

    match value {
        FieldValue::Missing => None,
        FieldValue::Number(n) => line(format_json_number(n)),
        FieldValue::Text(s) => line(s.clone()),
        FieldValue::List(items) => line(items.join(", ")),
        FieldValue::Mapping(pairs) => Some(FieldEntry::Group {
            label: label.clone(),
            lines: pairs.clone(),
        }),
        FieldValue::Other(s) => line(s.clone()),
    }
}

/// Raw key with its first character upper-cased; nothing else changes.
pub fn label_for(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Verbatim string conversion: strings unquoted, everything else as JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
