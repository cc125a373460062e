//! Row data handling
//!
//! This module provides:
//! - [`Value`], the cell and bind value type shared with the native driver
//! - [`Row`], a raw row as the driver returns it (ordered names and values)
//! - [`FetchedRow`], a row after fetch-style shaping and case folding
//! - [`BindVar`], a caller-owned slot that execute and fetch write back into

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::constants::{CaseMode, NullMode};

/// A value bound to a placeholder or read from a column.
///
/// # Example
///
/// ```rust
/// use oracle_adapter::Value;
///
/// let v: Value = "tester@testing.com".into();
/// assert_eq!(v.as_str(), Some("tester@testing.com"));
/// assert!(Value::from(None::<i64>).is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Character data
    String(String),
    /// Binary data (RAW, BLOB contents)
    Bytes(Bytes),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) => Some(*f as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to get as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to get as bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(&b[..]),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            ),
        }
    }

    /// Apply the connection's NULL conversion
    fn convert_nulls(self, mode: NullMode) -> Value {
        match (mode, self) {
            (NullMode::EmptyString, Value::String(s)) if s.is_empty() => Value::Null,
            (NullMode::ToString, Value::Null) => Value::String(String::new()),
            (_, v) => v,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Caller-owned slot written back by execute (output parameters) and by
/// fetch (bound columns).
///
/// Clones share the same slot, so the caller keeps one clone and hands another
/// to the statement, then re-reads it after the operation.
///
/// ```rust
/// use oracle_adapter::{BindVar, Value};
///
/// let id = BindVar::new(Value::Null);
/// let seen_by_statement = id.clone();
/// seen_by_statement.set(Value::Integer(7));
/// assert_eq!(id.get(), Value::Integer(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindVar(Rc<RefCell<Value>>);

impl BindVar {
    /// Create a slot holding an initial value
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Rc::new(RefCell::new(value.into())))
    }

    /// Current value of the slot
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Overwrite the slot
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }

    /// Overwrite the slot, returning the previous value
    pub fn replace(&self, value: impl Into<Value>) -> Value {
        self.0.replace(value.into())
    }

    /// Whether two handles refer to the same slot
    pub fn same_slot(&self, other: &BindVar) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A raw row as returned by the native driver.
///
/// Column names come back exactly as the driver reports them (upper case for
/// Oracle) and values stay in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column values
    values: Vec<Value>,
    /// Column names, same length as `values`
    column_names: Vec<String>,
}

impl Row {
    /// Create a row from `(name, value)` pairs
    pub fn from_pairs<N, V, I>(pairs: I) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (N, V)>,
    {
        let (column_names, values) = pairs
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .unzip();
        Self {
            values,
            column_names,
        }
    }

    /// Get the number of columns in this row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index (0-based)
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self
            .column_names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }

    /// Column names in select-list order
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Get all values as a slice
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// How a raw row is laid out before case folding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowStyle {
    Assoc,
    Num,
    Both,
}

/// Key of a row fetched in `Both` style
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    /// 0-based column position
    Index(usize),
    /// Column name after case folding
    Name(String),
}

impl From<usize> for RowKey {
    fn from(v: usize) -> Self {
        RowKey::Index(v)
    }
}

impl From<&str> for RowKey {
    fn from(v: &str) -> Self {
        RowKey::Name(v.to_string())
    }
}

/// Object-like row: named properties in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowObject {
    properties: IndexMap<String, Value>,
}

impl RowObject {
    /// Build from an associative row
    pub fn from_map(properties: IndexMap<String, Value>) -> Self {
        Self { properties }
    }

    /// Read a property
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Property names in order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// All properties
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Convert to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

/// A row after fetch-style shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRow {
    /// Column name keyed map
    Assoc(IndexMap<String, Value>),
    /// Position keyed list
    Num(Vec<Value>),
    /// Keyed by position and by name
    Both(IndexMap<RowKey, Value>),
    /// Object-like value
    Object(RowObject),
}

impl FetchedRow {
    /// Look up a cell by (folded) column name
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            FetchedRow::Assoc(map) => map.get(name),
            FetchedRow::Both(map) => map.get(&RowKey::Name(name.to_string())),
            FetchedRow::Object(obj) => obj.get(name),
            FetchedRow::Num(_) => None,
        }
    }

    /// Look up a cell by 0-based position
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            FetchedRow::Num(values) => values.get(index),
            FetchedRow::Both(map) => map.get(&RowKey::Index(index)),
            FetchedRow::Assoc(map) => map.get_index(index).map(|(_, v)| v),
            FetchedRow::Object(obj) => obj.properties().get_index(index).map(|(_, v)| v),
        }
    }

    /// String keys of the row, in order
    pub fn names(&self) -> Vec<&str> {
        match self {
            FetchedRow::Assoc(map) => map.keys().map(String::as_str).collect(),
            FetchedRow::Both(map) => map
                .keys()
                .filter_map(|k| match k {
                    RowKey::Name(n) => Some(n.as_str()),
                    RowKey::Index(_) => None,
                })
                .collect(),
            FetchedRow::Object(obj) => obj.property_names().collect(),
            FetchedRow::Num(_) => Vec::new(),
        }
    }

    /// Whether this row was converted to an object
    pub fn is_object(&self) -> bool {
        matches!(self, FetchedRow::Object(_))
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FetchedRow::Assoc(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            FetchedRow::Num(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            FetchedRow::Both(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let key = match k {
                            RowKey::Index(i) => i.to_string(),
                            RowKey::Name(n) => n.clone(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
            FetchedRow::Object(obj) => obj.to_json(),
        }
    }
}

/// Lay out a raw row, fold string keys, convert NULLs and optionally turn an
/// associative row into an object.
pub(crate) fn shape_row(
    row: Row,
    style: RowStyle,
    case: CaseMode,
    nulls: NullMode,
    as_object: bool,
) -> FetchedRow {
    let Row {
        values,
        column_names,
    } = row;
    let values = values.into_iter().map(|v| v.convert_nulls(nulls));

    match style {
        RowStyle::Num => FetchedRow::Num(values.collect()),
        RowStyle::Both => {
            let mut map = IndexMap::with_capacity(column_names.len() * 2);
            for (index, (name, value)) in column_names.iter().zip(values).enumerate() {
                map.insert(RowKey::Index(index), value.clone());
                map.insert(RowKey::Name(case.fold(name)), value);
            }
            FetchedRow::Both(map)
        }
        RowStyle::Assoc => {
            let map: IndexMap<String, Value> = column_names
                .iter()
                .map(|name| case.fold(name))
                .zip(values)
                .collect();
            if as_object {
                FetchedRow::Object(RowObject::from_map(map))
            } else {
                FetchedRow::Assoc(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Row {
        Row::from_pairs([
            ("FNAME", "Test"),
            ("LNAME", "Testerson"),
            ("EMAIL", "tester@testing.com"),
        ])
    }

    #[test]
    fn test_value_null() {
        let v = Value::Null;
        assert!(v.is_null());
        assert!(v.as_str().is_none());
        assert!(v.as_i64().is_none());
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42).as_i64(), Some(42));
        assert_eq!(Value::from("17").as_i64(), Some(17));
        assert_eq!(Value::from(true).as_i64(), Some(1));
        assert_eq!(Value::from(vec![1u8, 2, 3]).as_bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(Value::Integer(1).as_bool(), Some(true));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Null), "NULL");
        assert_eq!(format!("{}", Value::Integer(42)), "42");
        assert_eq!(format!("{}", Value::String("test".into())), "test");
        assert_eq!(format!("{}", Value::from(vec![1u8, 2, 3])), "<3 bytes>");
    }

    #[test]
    fn test_bind_var_shares_slot() {
        let a = BindVar::new(1);
        let b = a.clone();
        b.set("changed");
        assert_eq!(a.get(), Value::from("changed"));
        assert!(a.same_slot(&b));
        assert!(!a.same_slot(&BindVar::default()));
        assert_eq!(a.replace(Value::Null), Value::from("changed"));
    }

    #[test]
    fn test_row_access() {
        let row = fixture();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0).and_then(Value::as_str), Some("Test"));
        assert_eq!(
            row.get_by_name("email").and_then(Value::as_str),
            Some("tester@testing.com")
        );
        assert!(row.get_by_name("missing").is_none());
    }

    #[test]
    fn test_shape_assoc_lower() {
        let shaped = shape_row(fixture(), RowStyle::Assoc, CaseMode::Lower, NullMode::Natural, false);
        assert_eq!(shaped.names(), vec!["fname", "lname", "email"]);
        assert_eq!(shaped.get("lname"), Some(&Value::from("Testerson")));
    }

    #[test]
    fn test_shape_natural_keeps_driver_case() {
        let shaped = shape_row(fixture(), RowStyle::Assoc, CaseMode::Natural, NullMode::Natural, true);
        assert!(shaped.is_object());
        assert_eq!(shaped.names(), vec!["FNAME", "LNAME", "EMAIL"]);
    }

    #[test]
    fn test_shape_both_has_positions_and_names() {
        let shaped = shape_row(fixture(), RowStyle::Both, CaseMode::Upper, NullMode::Natural, false);
        assert_eq!(shaped.get_index(2), Some(&Value::from("tester@testing.com")));
        assert_eq!(shaped.get("FNAME"), Some(&Value::from("Test")));
        assert_eq!(shaped.names().len(), 3);
    }

    #[test]
    fn test_shape_num() {
        let shaped = shape_row(fixture(), RowStyle::Num, CaseMode::Lower, NullMode::Natural, true);
        assert!(!shaped.is_object());
        assert_eq!(shaped.get_index(1), Some(&Value::from("Testerson")));
        assert!(shaped.get("lname").is_none());
    }

    #[test]
    fn test_null_conversion() {
        let row = Row::from_pairs([("A", Value::from("")), ("B", Value::Null)]);
        let empty = shape_row(row.clone(), RowStyle::Num, CaseMode::Natural, NullMode::EmptyString, false);
        assert_eq!(empty.get_index(0), Some(&Value::Null));

        let to_string = shape_row(row, RowStyle::Num, CaseMode::Natural, NullMode::ToString, false);
        assert_eq!(to_string.get_index(1), Some(&Value::from("")));
    }

    #[test]
    fn test_object_to_json() {
        let shaped = shape_row(fixture(), RowStyle::Assoc, CaseMode::Lower, NullMode::Natural, true);
        assert_eq!(
            shaped.to_json(),
            serde_json::json!({
                "fname": "Test",
                "lname": "Testerson",
                "email": "tester@testing.com"
            })
        );
    }
}
