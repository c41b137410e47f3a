//! Runtime values.
//!
//! Six value kinds: number, text, boolean, list, table and nothing.
//! Lists and tables are shared handles: every name bound to the same list
//! sees the same contents, and changes made through one name show through
//! all of them. Step and riser calls copy their arguments instead (see
//! [`Value::deep_copy`]).
//!
//! Tables keep insertion order and use text keys; any other key is
//! normalized to its display form before it is stored or looked up.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use steps_types::ast::TypeName;

/// Shared storage behind a list value.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared storage behind a table value.
pub type TableRef = Rc<RefCell<Table>>;

/// A Steps runtime value.
///
/// Cloning a list or table clones the handle, not the contents.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    List(ListRef),
    Table(TableRef),
    Nothing,
}

impl Value {
    /// A fresh list holding `items`.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// A fresh table holding `table`.
    pub fn table(table: Table) -> Self {
        Value::Table(Rc::new(RefCell::new(table)))
    }

    /// The value a declared variable holds before its first `set`.
    pub fn default_for(type_name: TypeName) -> Self {
        match type_name {
            TypeName::Number => Value::Number(0.0),
            TypeName::Text => Value::Text(String::new()),
            TypeName::Boolean => Value::Boolean(false),
            TypeName::List => Value::list(Vec::new()),
            TypeName::Table => Value::table(Table::new()),
        }
    }

    /// A copy that shares no list or table storage with `self`.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_copy).collect()),
            Value::Table(table) => Value::table(
                table
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.deep_copy()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Whether `self` and `other` are handles to the same list or table.
    pub fn same_storage(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether `container` is `self` or is reachable from inside it.
    ///
    /// Storing `self` into `container` is refused when this holds, so no
    /// list or table ever contains itself.
    pub fn reaches(&self, container: &Value) -> bool {
        if self.same_storage(container) {
            return true;
        }
        match self {
            Value::List(items) => items.borrow().iter().any(|item| item.reaches(container)),
            Value::Table(table) => table.borrow().iter().any(|(_, value)| value.reaches(container)),
            _ => false,
        }
    }

    /// The name `type of` reports for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
            Value::Table(_) => "table",
            Value::Nothing => "nothing",
        }
    }

    /// Whether this value is of the given declarable type.
    pub fn is_type(&self, type_name: TypeName) -> bool {
        matches!(
            (self, type_name),
            (Value::Number(_), TypeName::Number)
                | (Value::Text(_), TypeName::Text)
                | (Value::Boolean(_), TypeName::Boolean)
                | (Value::List(_), TypeName::List)
                | (Value::Table(_), TypeName::Table)
        )
    }

    /// Truthiness: zero, empty text/list/table, `false` and `nothing` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Table(table) => !table.borrow().is_empty(),
            Value::Nothing => false,
        }
    }

    /// The text a table stores this value under when used as a key.
    pub fn to_key(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// A whole, non-negative number usable as a position.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && n.is_finite() => Some(*n as usize),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; values of different kinds are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Table(a), Value::Table(b)) => *a.borrow() == *b.borrow(),
            (Value::Nothing, Value::Nothing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("true"),
            Value::Boolean(false) => f.write_str("false"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Table(table) => {
                f.write_str("[")?;
                for (i, (key, value)) in table.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{key}\": {value}")?;
                }
                f.write_str("]")
            }
            Value::Nothing => f.write_str("nothing"),
        }
    }
}

/// Integral numbers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Table
// ══════════════════════════════════════════════════════════════════════════════

/// An insertion-ordered map from text keys to values.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(String, Value)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replace the value under `key`, or append a new entry.
    pub fn insert(&mut self, key: String, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Table {
    /// Same keys mapped to equal values; insertion order does not matter.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}

impl FromIterator<(String, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut table = Table::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, f64)]) -> Table {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Number(*v)))
            .collect()
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(0.1 + 0.2).to_string(), "0.30000000000000004");
    }

    #[test]
    fn test_collection_display() {
        let list = Value::list(vec![Value::from(1.0), Value::from("a"), Value::Nothing]);
        assert_eq!(list.to_string(), "[1, a, nothing]");
        assert_eq!(Value::table(table(&[("x", 1.0), ("y", 2.5)])).to_string(), "[\"x\": 1, \"y\": 2.5]");
        assert_eq!(Value::table(Table::new()).to_string(), "[]");
    }

    #[test]
    fn test_table_insert_keeps_order_and_replaces() {
        let mut t = table(&[("b", 1.0), ("a", 2.0)]);
        t.insert("b".into(), Value::from(9.0));
        t.insert("c".into(), Value::from(3.0));
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(t.get("b"), Some(&Value::Number(9.0)));
    }

    #[test]
    fn test_table_equality_ignores_order() {
        assert_eq!(table(&[("a", 1.0), ("b", 2.0)]), table(&[("b", 2.0), ("a", 1.0)]));
        assert_ne!(table(&[("a", 1.0)]), table(&[("a", 2.0)]));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(
            Value::list(vec![Value::from(1.0), Value::from("x")]),
            Value::list(vec![Value::from(1.0), Value::from("x")])
        );
        assert_ne!(Value::from(1.0), Value::from("1"));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_eq!(Value::Nothing, Value::Nothing);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::Nothing.is_truthy());
    }

    #[test]
    fn test_defaults_match_declared_type() {
        for t in [TypeName::Number, TypeName::Text, TypeName::Boolean, TypeName::List, TypeName::Table] {
            assert!(Value::default_for(t).is_type(t));
        }
    }

    #[test]
    fn test_keys_and_indices() {
        assert_eq!(Value::from(2.0).to_key(), "2");
        assert_eq!(Value::from("k").to_key(), "k");
        assert_eq!(Value::from(3.0).as_index(), Some(3));
        assert_eq!(Value::from(-1.0).as_index(), None);
        assert_eq!(Value::from(1.5).as_index(), None);
    }

    #[test]
    fn test_clone_shares_collection_storage() {
        let a = Value::list(vec![Value::from(1.0)]);
        let b = a.clone();
        if let Value::List(items) = &b {
            items.borrow_mut().push(Value::from(2.0));
        }
        assert_eq!(a.to_string(), "[1, 2]");
        assert!(a.same_storage(&b));
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let inner = Value::list(vec![Value::from(1.0)]);
        let outer = Value::list(vec![inner.clone()]);
        let copy = outer.deep_copy();
        if let Value::List(items) = &inner {
            items.borrow_mut().push(Value::from(2.0));
        }
        assert_eq!(outer.to_string(), "[[1, 2]]");
        assert_eq!(copy.to_string(), "[[1]]");
        assert!(!copy.same_storage(&outer));
    }

    #[test]
    fn test_reaches_finds_nested_storage() {
        let inner = Value::list(vec![]);
        let outer = Value::table([("row".to_string(), inner.clone())].into_iter().collect());
        assert!(outer.reaches(&inner));
        assert!(inner.reaches(&inner));
        assert!(!inner.reaches(&outer));
        assert!(!Value::from(1.0).reaches(&inner));
    }
}
