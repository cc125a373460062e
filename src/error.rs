//! Error types for the adapter
//!
//! Two kinds of failure cross the adapter boundary. Structural problems
//! (unknown bind types, bad column ordinals, dead handles, unsupported calls)
//! are raised as [`Error`]. Data-dependent outcomes (a failed execute, an
//! exhausted cursor, committing with nothing open) come back as `Ok(false)` or
//! `Ok(None)` and leave an [`ErrorInfo`] triple behind for the caller to inspect.

use std::fmt;

use thiserror::Error;

use crate::driver::NativeError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// SQLSTATE-like codes surfaced in the error triple.
///
/// Callers branch on these values; they must not change.
pub mod sqlstate {
    /// No error
    pub const SUCCESS: &str = "00000";
    /// Execute or fetch produced no result
    pub const NO_RESULT: &str = "07000";
    /// Connection does not exist
    pub const CONNECTION_DOES_NOT_EXIST: &str = "08003";
    /// Connection failure
    pub const CONNECTION_FAILURE: &str = "08006";
    /// Commit failure
    pub const COMMIT_FAILURE: &str = "08007";
    /// Feature not supported (invalid resource, invalid execute mode)
    pub const FEATURE_NOT_SUPPORTED: &str = "0A000";
    /// Already inside a transaction
    pub const INVALID_TRANSACTION_STATE: &str = "25000";
    /// Rollback failure
    pub const ROLLBACK_FAILURE: &str = "40003";
    /// Generic driver error
    pub const GENERAL_ERROR: &str = "HY000";
    /// Driver does not support this function
    pub const DRIVER_NOT_SUPPORTED: &str = "IM001";
}

/// Main error type for the adapter
#[derive(Error, Debug)]
pub enum Error {
    /// The native client could not open a session
    #[error("connect failed{}: {message}", code.map(|c| format!(" (ORA-{:05})", c)).unwrap_or_default())]
    ConnectFailed {
        /// Native error code, when the client reported one
        code: Option<i64>,
        /// Native error message
        message: String,
    },

    /// `begin_transaction` while a transaction is already open
    #[error("there is already an active transaction")]
    AlreadyInTransaction,

    /// Native commit failed; transaction state is unchanged
    #[error("commit failed{}: {message}", code.map(|c| format!(" (ORA-{:05})", c)).unwrap_or_default())]
    CommitFailed {
        /// Native error code
        code: Option<i64>,
        /// Native error message
        message: String,
    },

    /// Native rollback failed; transaction state is unchanged
    #[error("rollback failed{}: {message}", code.map(|c| format!(" (ORA-{:05})", c)).unwrap_or_default())]
    RollbackFailed {
        /// Native error code
        code: Option<i64>,
        /// Native error message
        message: String,
    },

    /// A native handle was missing or no longer live
    #[error("invalid native resource: {0}")]
    InvalidResource(String),

    /// An execute mode outside the two supported values
    #[error("invalid execute mode: {0:#x}")]
    InvalidExecuteMode(u32),

    /// Operation the adapter does not provide
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Bad caller input (unknown bind type, column ordinal, fetch mode)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic parameter type tag with no native mapping
    #[error("unknown parameter type: {0:#x}")]
    UnknownType(i64),

    /// The owning connection has been closed
    #[error("connection is closed")]
    ConnectionClosed,

    /// Error reported by the native client outside the cases above
    #[error(transparent)]
    Native(#[from] NativeError),
}

impl Error {
    /// SQLSTATE-like code for this error, if it has one.
    ///
    /// Argument errors are raised without a SQLSTATE.
    pub fn sqlstate(&self) -> Option<&'static str> {
        match self {
            Error::ConnectFailed { .. } => Some(sqlstate::CONNECTION_FAILURE),
            Error::AlreadyInTransaction => Some(sqlstate::INVALID_TRANSACTION_STATE),
            Error::CommitFailed { .. } => Some(sqlstate::COMMIT_FAILURE),
            Error::RollbackFailed { .. } => Some(sqlstate::ROLLBACK_FAILURE),
            Error::InvalidResource(_) | Error::InvalidExecuteMode(_) => {
                Some(sqlstate::FEATURE_NOT_SUPPORTED)
            }
            Error::NotSupported(_) => Some(sqlstate::DRIVER_NOT_SUPPORTED),
            Error::ConnectionClosed => Some(sqlstate::CONNECTION_DOES_NOT_EXIST),
            Error::Native(_) => Some(sqlstate::GENERAL_ERROR),
            Error::InvalidArgument(_) | Error::UnknownType(_) => None,
        }
    }

    /// Native error code carried by this error, if any
    pub fn native_code(&self) -> Option<i64> {
        match self {
            Error::ConnectFailed { code, .. }
            | Error::CommitFailed { code, .. }
            | Error::RollbackFailed { code, .. } => *code,
            Error::Native(e) => Some(e.code),
            _ => None,
        }
    }

    /// Check if this is a connection-related error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::ConnectFailed { .. } | Error::ConnectionClosed)
    }

    /// Check if this error comes from bad caller input
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::UnknownType(_))
    }

    /// The error triple describing this error
    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo {
            sqlstate: self
                .sqlstate()
                .unwrap_or(sqlstate::GENERAL_ERROR)
                .to_string(),
            code: self.native_code(),
            message: Some(self.to_string()),
        }
    }
}

/// Last-operation error triple: (SQLSTATE, native code, message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// SQLSTATE-like code, `00000` when the last operation succeeded
    pub sqlstate: String,
    /// Native driver error code
    pub code: Option<i64>,
    /// Native driver message
    pub message: Option<String>,
}

impl ErrorInfo {
    /// Build a triple from its parts
    pub fn new(sqlstate: impl Into<String>, code: Option<i64>, message: Option<String>) -> Self {
        Self {
            sqlstate: sqlstate.into(),
            code,
            message,
        }
    }

    /// Triple for an operation that returned no result
    pub fn no_result(native: Option<&NativeError>) -> Self {
        Self {
            sqlstate: sqlstate::NO_RESULT.to_string(),
            code: native.map(|e| e.code),
            message: native.map(|e| e.message.clone()),
        }
    }

    /// Whether this triple records a failure
    pub fn is_error(&self) -> bool {
        self.sqlstate != sqlstate::SUCCESS
    }

    /// Reset to the success triple
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for ErrorInfo {
    fn default() -> Self {
        Self {
            sqlstate: sqlstate::SUCCESS.to_string(),
            code: None,
            message: None,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQLSTATE[{}]", self.sqlstate)?;
        if let Some(code) = self.code {
            write!(f, " ORA-{:05}", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}
