//! Pagination cursor
//!
//! A [`Cursor`] holds the values the FEC API needs to resume keyset
//! pagination after a given record (`last_index` plus the last value of the
//! sort field). The same type is produced by the server (`last_indexes`) and
//! by the checkpoint query, and is merged into request parameters with
//! [`Cursor::apply_to`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Query parameters sent with a page request
pub type QueryParams = BTreeMap<String, String>;

/// Resume position, keyed by cursor-field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor {
    values: BTreeMap<String, Value>,
}

impl Cursor {
    /// Create an empty cursor
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Raw value of a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Field value rendered as a query-string value; `None` for missing or null fields
    pub fn param_value(&self, field: &str) -> Option<String> {
        self.values.get(field).and_then(render_param)
    }

    /// Whether the cursor carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge this cursor into request parameters.
    ///
    /// Every field named in `cursor_fields` is written; a field the cursor
    /// lacks, or holds as null, removes any stale value for that parameter
    /// so a cursor never mixes with a previous page's values.
    pub fn apply_to(&self, cursor_fields: &[&str], params: &mut QueryParams) {
        for field in cursor_fields {
            match self.param_value(field) {
                Some(value) => {
                    params.insert((*field).to_string(), value);
                }
                None => {
                    params.remove(*field);
                }
            }
        }
    }

    /// Compare the monotonic id component of two cursors.
    ///
    /// Returns `None` when either side lacks the id field.
    pub fn compare_id(&self, other: &Cursor, id_field: &str) -> Option<Ordering> {
        let a = self.param_value(id_field)?;
        let b = other.param_value(id_field)?;
        Some(compare_ids(&a, &b))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={}", render_param(v).unwrap_or_else(|| "null".into())))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

fn render_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Order two record ids.
///
/// FEC `sub_id` values are decimal integers that can exceed `i64`, so
/// all-digit ids are compared by magnitude without parsing; anything else
/// falls back to plain string order.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());
    if is_digits(a) && is_digits(b) {
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    } else {
        a.cmp(b)
    }
}
