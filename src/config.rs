//! Connection attributes
//!
//! [`Config`] carries the attributes a connection is created with and serves
//! as the attribute store for [`crate::Connection::get_attribute`] and
//! [`crate::Connection::set_attribute`] afterwards.

use indexmap::IndexMap;

use crate::constants::{Attribute, CaseMode, ErrorMode, FetchMode, NullMode};
use crate::error::{Error, Result};
use crate::row::Value;

/// Attributes recognized by the connection.
///
/// # Examples
///
/// ```rust
/// use oracle_adapter::{CaseMode, Config, ErrorMode};
///
/// let config = Config::new()
///     .with_case(CaseMode::Natural)
///     .with_error_mode(ErrorMode::Warning)
///     .with_persistent(true);
/// assert!(config.persistent);
/// ```
///
/// Attributes can also be given as integer keyed pairs, the way a generic
/// data layer passes them:
///
/// ```rust
/// use oracle_adapter::{Attribute, Config, Value};
///
/// let config = Config::from_attributes([
///     (Attribute::Case, Value::Integer(1)),
///     (Attribute::Autocommit, Value::Boolean(false)),
/// ]).unwrap();
/// assert!(!config.autocommit);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Reported auto-commit flag
    pub autocommit: bool,
    /// How failures are reported
    pub error_mode: ErrorMode,
    /// Column-name folding on fetch
    pub case: CaseMode,
    /// NULL conversion on fetch
    pub oracle_nulls: NullMode,
    /// Ask the driver for a persistent session
    pub persistent: bool,
    /// Fetch mode new statements start with
    pub default_fetch_mode: FetchMode,
    /// Any other attribute, stored as given
    extra: IndexMap<Attribute, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autocommit: true,
            error_mode: ErrorMode::Exception,
            case: CaseMode::Lower,
            oracle_nulls: NullMode::Natural,
            persistent: false,
            default_fetch_mode: FetchMode::Class,
            extra: IndexMap::new(),
        }
    }
}

impl Config {
    /// Configuration with every attribute at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(attribute, value)` pairs, validating recognized keys
    pub fn from_attributes<I>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Attribute, Value)>,
    {
        let mut config = Self::default();
        for (attr, value) in attributes {
            config.set(attr, value)?;
        }
        Ok(config)
    }

    /// Set the auto-commit flag
    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Set the error mode
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Set column-name case folding
    pub fn with_case(mut self, case: CaseMode) -> Self {
        self.case = case;
        self
    }

    /// Set NULL conversion
    pub fn with_oracle_nulls(mut self, nulls: NullMode) -> Self {
        self.oracle_nulls = nulls;
        self
    }

    /// Request a persistent session
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Set the fetch mode new statements start with
    pub fn with_default_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.default_fetch_mode = mode;
        self
    }

    /// Set any attribute
    pub fn with_attribute(mut self, attr: Attribute, value: impl Into<Value>) -> Result<Self> {
        self.set(attr, value.into())?;
        Ok(self)
    }

    /// Store an attribute.
    ///
    /// Recognized attributes are validated and stored in their typed field;
    /// anything else lands in the open-ended store unchanged.
    pub fn set(&mut self, attr: Attribute, value: Value) -> Result<()> {
        match attr {
            Attribute::Autocommit => self.autocommit = expect_bool(attr, &value)?,
            Attribute::Persistent => self.persistent = expect_bool(attr, &value)?,
            Attribute::ErrorMode => {
                self.error_mode = expect_enum(attr, &value, ErrorMode::from_i64)?
            }
            Attribute::Case => self.case = expect_enum(attr, &value, CaseMode::from_i64)?,
            Attribute::OracleNulls => {
                self.oracle_nulls = expect_enum(attr, &value, NullMode::from_i64)?
            }
            Attribute::DefaultFetchMode => {
                self.default_fetch_mode = expect_enum(attr, &value, FetchMode::from_i64)?
            }
            _ => {
                self.extra.insert(attr, value);
            }
        }
        Ok(())
    }

    /// Read an attribute held by the configuration
    pub fn get(&self, attr: Attribute) -> Option<Value> {
        match attr {
            Attribute::Autocommit => Some(Value::Boolean(self.autocommit)),
            Attribute::Persistent => Some(Value::Boolean(self.persistent)),
            Attribute::ErrorMode => Some(Value::Integer(self.error_mode as i64)),
            Attribute::Case => Some(Value::Integer(self.case as i64)),
            Attribute::OracleNulls => Some(Value::Integer(self.oracle_nulls as i64)),
            Attribute::DefaultFetchMode => Some(Value::Integer(self.default_fetch_mode as i64)),
            _ => self.extra.get(&attr).cloned(),
        }
    }

    /// Attributes outside the recognized set
    pub fn extra(&self) -> &IndexMap<Attribute, Value> {
        &self.extra
    }
}

fn expect_bool(attr: Attribute, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::InvalidArgument(format!("{:?} expects a boolean, got {}", attr, value)))
}

fn expect_enum<T>(attr: Attribute, value: &Value, parse: fn(i64) -> Option<T>) -> Result<T> {
    value
        .as_i64()
        .and_then(parse)
        .ok_or_else(|| Error::InvalidArgument(format!("invalid value {} for {:?}", value, attr)))
}
