//! Positional to named placeholder translation
//!
//! Generic callers write `?` placeholders; the Oracle client only binds by
//! name. [`translate`] rewrites every `?` into `:0`, `:1`, ... in
//! left-to-right order. The split is on the raw character: a `?` inside a
//! quoted literal is rewritten too.

use std::borrow::Cow;

use crate::constants::OracleType;
use crate::row::Value;

/// Result of translating a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated<'a> {
    /// Query text with named placeholders
    pub sql: Cow<'a, str>,
    /// Number of `?` placeholders replaced
    pub placeholders: usize,
}

/// Rewrite positional placeholders into named ones.
///
/// Returns the input borrowed when it has no `?`. Otherwise every segment
/// between placeholders is trimmed and the pieces are joined by single spaces
/// around the generated `:N` markers.
///
/// ```rust
/// use oracle_adapter::translate::translate;
///
/// let t = translate("select * from t where id = ? and name = ?");
/// assert_eq!(t.sql, "select * from t where id = :0 and name = :1");
/// assert_eq!(t.placeholders, 2);
/// ```
pub fn translate(sql: &str) -> Translated<'_> {
    let segments: Vec<&str> = sql.split('?').collect();
    let placeholders = segments.len() - 1;

    if placeholders == 0 {
        return Translated {
            sql: Cow::Borrowed(sql),
            placeholders,
        };
    }

    let mut out = String::with_capacity(sql.len() + placeholders * 4);
    for (index, segment) in segments.iter().enumerate() {
        push_piece(&mut out, segment.trim());
        if index < placeholders {
            push_piece(&mut out, &format!(":{}", index));
        }
    }

    tracing::trace!(sql = sql, translated = out.as_str(), placeholders, "Translated placeholders");

    Translated {
        sql: Cow::Owned(out),
        placeholders,
    }
}

fn push_piece(out: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(piece);
}

/// Normalize a parameter identifier to the name the native binder expects.
///
/// Ordinals become `:{ordinal}`; names pass through unchanged.
pub fn bind_name(param: &ParamId) -> String {
    match param {
        ParamId::Position(n) => format!(":{}", n),
        ParamId::Name(name) => name.clone(),
    }
}

/// Identifies a placeholder by ordinal or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamId {
    /// 0-based ordinal, bound as `:{ordinal}`
    Position(usize),
    /// Placeholder name as written in the query
    Name(String),
}

impl From<usize> for ParamId {
    fn from(v: usize) -> Self {
        ParamId::Position(v)
    }
}

impl From<&str> for ParamId {
    fn from(v: &str) -> Self {
        ParamId::Name(v.to_string())
    }
}

impl From<String> for ParamId {
    fn from(v: String) -> Self {
        ParamId::Name(v)
    }
}

/// One registered parameter
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    /// Registration order
    pub ordinal: usize,
    /// Normalized bind name
    pub name: String,
    /// Value at bind time
    pub value: Value,
    /// Bound by reference (written back after execute)
    pub by_ref: bool,
    /// Generic type tag as supplied
    pub param_type: i64,
    /// Native type the tag resolved to
    pub native_type: OracleType,
    /// Effective max length passed to the native binder
    pub max_length: i64,
}

/// Append-only list of the parameters bound on one statement.
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    entries: Vec<BoundParam>,
}

impl ParamRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its ordinal
    pub fn register(
        &mut self,
        name: String,
        value: Value,
        by_ref: bool,
        param_type: i64,
        native_type: OracleType,
        max_length: i64,
    ) -> usize {
        let ordinal = self.entries.len();
        self.entries.push(BoundParam {
            ordinal,
            name,
            value,
            by_ref,
            param_type,
            native_type,
            max_length,
        });
        ordinal
    }

    /// All entries in registration order
    pub fn entries(&self) -> &[BoundParam] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest entry registered under `name`
    pub fn last_for(&self, name: &str) -> Option<&BoundParam> {
        self.entries.iter().rev().find(|p| p.name == name)
    }
}
