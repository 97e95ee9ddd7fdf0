//! Dotted field paths and field-level document updates.
//!
//! # Invariants
//! - Every path segment matches `[A-Za-z0-9_-]+`; segments are joined by `.`.
//! - `FieldValue::Delete` removes the addressed key; it never writes `null`.
//! - Deleting a path that does not exist is a no-op.

use super::{Document, StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid field segment regex"));

/// Validated path to a (possibly nested) document field, e.g. `attendees.u1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted path.
    pub fn parse(path: &str) -> StoreResult<Self> {
        Self::from_segments(path.split('.'))
    }

    /// Builds a path from individual segments (map keys are often user ids).
    pub fn from_segments<I, S>(segments: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for segment in segments {
            let segment = segment.as_ref();
            if !SEGMENT_RE.is_match(segment) {
                return Err(StoreError::InvalidFieldPath(segment.to_string()));
            }
            parsed.push(segment.to_string());
        }
        if parsed.is_empty() {
            return Err(StoreError::InvalidFieldPath(String::new()));
        }
        Ok(Self { segments: parsed })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// SQLite JSON path expression (`$."a"."b"`).
    pub(crate) fn json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.segments {
            out.push_str(".\"");
            out.push_str(segment);
            out.push('"');
        }
        out
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// New value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    /// Removes the field from the document.
    Delete,
}

/// One field-level mutation applied by `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub value: FieldValue,
}

impl FieldUpdate {
    pub fn set(path: FieldPath, value: impl Into<Value>) -> Self {
        Self {
            path,
            value: FieldValue::Set(value.into()),
        }
    }

    pub fn delete(path: FieldPath) -> Self {
        Self {
            path,
            value: FieldValue::Delete,
        }
    }
}

/// Applies updates in order to a document body.
///
/// Intermediate maps are created on `Set`; a non-object intermediate value is
/// replaced by a map.
pub fn apply_updates(document: &mut Document, updates: &[FieldUpdate]) {
    for update in updates {
        match &update.value {
            FieldValue::Set(value) => set_path(document, update.path.segments(), value.clone()),
            FieldValue::Delete => delete_path(document, update.path.segments()),
        }
    }
}

fn set_path(document: &mut Document, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = document;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(leaf.clone(), value);
}

fn delete_path(document: &mut Document, segments: &[String]) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = document;
    for segment in parents {
        current = match current.get_mut(segment) {
            Some(Value::Object(map)) => map,
            _ => return,
        };
    }
    current.remove(leaf);
}
