//! Generic parameter type tags to native bind types
//!
//! | Tag            | Native type        |
//! |----------------|--------------------|
//! | `BOOL`         | `BinaryInteger`    |
//! | `NULL`         | `Varchar`          |
//! | `INT`          | `BinaryInteger`    |
//! | `STR`          | `Varchar`          |
//! | `INPUT_OUTPUT` | `Varchar`          |
//! | `LOB`          | `Blob`             |
//!
//! The client has no NULL bind type; an empty character bind is NULL on the
//! server. Everything outside the table is [`Error::UnknownType`].

use crate::constants::{param, OracleType, LEGACY_OUTPUT_MIN_LENGTH};
use crate::error::{Error, Result};

/// Native bind type for a generic parameter tag
pub fn native_type_for(tag: i64) -> Result<OracleType> {
    match tag {
        param::BOOL => Ok(OracleType::BinaryInteger),
        param::NULL => Ok(OracleType::Varchar),
        param::INT => Ok(OracleType::BinaryInteger),
        param::STR => Ok(OracleType::Varchar),
        param::INPUT_OUTPUT => Ok(OracleType::Varchar),
        param::LOB => Ok(OracleType::Blob),
        _ => Err(Error::UnknownType(tag)),
    }
}

/// Generic tag for a native bind type, used when reporting parameters back
pub fn generic_tag_for(native: OracleType) -> i64 {
    match native {
        OracleType::BinaryInteger | OracleType::Number => param::INT,
        OracleType::Boolean => param::BOOL,
        OracleType::Blob | OracleType::Clob => param::LOB,
        _ => param::STR,
    }
}

/// Whether `tag` is the legacy `INT | INPUT_OUTPUT` output alias
pub fn is_legacy_output_alias(tag: i64) -> bool {
    tag == (param::INT | param::INPUT_OUTPUT)
}

/// Resolve a tag for a by-reference bind.
///
/// Same as [`native_type_for`], except the legacy `INT | INPUT_OUTPUT` alias
/// binds as a string output with a buffer of at least
/// [`LEGACY_OUTPUT_MIN_LENGTH`]. Returns the native type and the effective
/// max length.
pub fn resolve_output_bind(tag: i64, max_length: i64) -> Result<(OracleType, i64)> {
    match native_type_for(tag) {
        Ok(native) => Ok((native, max_length)),
        Err(Error::UnknownType(_)) if is_legacy_output_alias(tag) => Ok((
            OracleType::Varchar,
            max_length.max(LEGACY_OUTPUT_MIN_LENGTH),
        )),
        Err(Error::UnknownType(t)) => Err(Error::InvalidArgument(format!(
            "unknown parameter type {:#x}",
            t
        ))),
        Err(e) => Err(e),
    }
}

/// Resolve a tag for a by-value or column bind; unknown tags are
/// [`Error::InvalidArgument`] with no alias fallback.
pub fn resolve_strict(tag: i64) -> Result<OracleType> {
    native_type_for(tag).map_err(|e| match e {
        Error::UnknownType(t) => {
            Error::InvalidArgument(format!("unknown parameter type {:#x}", t))
        }
        other => other,
    })
}
