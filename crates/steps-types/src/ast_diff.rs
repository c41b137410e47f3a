//! Structural AST comparison that ignores source positions.
//!
//! Two parses of differently formatted source describe the same program
//! when every node matches apart from its `span`. The diff walks the
//! serde representation of both trees and reports dot-separated paths
//! (e.g. `Building.body.stmts[2].kind.Set.value`) where they disagree.

use crate::ast::Program;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ══════════════════════════════════════════════════════════════════════════════
// Types
// ══════════════════════════════════════════════════════════════════════════════

/// A single change between two ASTs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstChange {
    /// Dot-separated path to the changed node.
    pub path: String,
    /// The kind of change.
    pub kind: ChangeKind,
}

/// What kind of change occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A node was added (not present in old AST).
    Added,
    /// A node was removed (not present in new AST).
    Removed,
    /// A node was modified (present in both, but different).
    Modified,
}

/// A structured, span-insensitive diff between two ASTs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstDiff {
    pub changes: Vec<AstChange>,
}

/// Field name skipped during comparison.
const SPAN_FIELD: &str = "span";

// ══════════════════════════════════════════════════════════════════════════════
// Core diff
// ══════════════════════════════════════════════════════════════════════════════

impl AstDiff {
    /// Compute the diff between two programs.
    pub fn diff(old: &Program, new: &Program) -> Self {
        let old = serde_json::to_value(old).unwrap_or(Value::Null);
        let new = serde_json::to_value(new).unwrap_or(Value::Null);
        let mut changes = Vec::new();
        diff_value("", &old, &new, &mut changes);
        AstDiff { changes }
    }

    /// True if the two ASTs are identical apart from spans.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Diff walkers
// ══════════════════════════════════════════════════════════════════════════════

fn push(changes: &mut Vec<AstChange>, path: &str, kind: ChangeKind) {
    changes.push(AstChange {
        path: path.to_string(),
        kind,
    });
}

fn field_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn diff_value(path: &str, old: &Value, new: &Value, changes: &mut Vec<AstChange>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, old_child) in a {
                if key == SPAN_FIELD {
                    continue;
                }
                let child = field_path(path, key);
                match b.get(key) {
                    Some(new_child) => diff_value(&child, old_child, new_child, changes),
                    None => push(changes, &child, ChangeKind::Removed),
                }
            }
            for key in b.keys() {
                if key != SPAN_FIELD && !a.contains_key(key) {
                    push(changes, &field_path(path, key), ChangeKind::Added);
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for (i, (old_item, new_item)) in a.iter().zip(b.iter()).enumerate() {
                diff_value(&format!("{path}[{i}]"), old_item, new_item, changes);
            }
            for i in b.len()..a.len() {
                push(changes, &format!("{path}[{i}]"), ChangeKind::Removed);
            }
            for i in a.len()..b.len() {
                push(changes, &format!("{path}[{i}]"), ChangeKind::Added);
            }
        }
        _ => {
            if old != new {
                push(changes, path, ChangeKind::Modified);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════════════════════
