//! Native client boundary
//!
//! The adapter never talks to the network itself. Everything on the wire is
//! delegated to an Oracle client library, reached through the traits in this
//! module. A production build implements them over the real client; tests use
//! [`crate::mock::MockDriver`].
//!
//! Handles are owned through [`Handle`], which records whether the adapter
//! still holds a live resource and releases it at most once.

use std::fmt;

use thiserror::Error;

use crate::constants::{ExecuteMode, OracleType};
use crate::row::{Row, Value};
use crate::statement::ColumnInfo;

/// Error reported by the native client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ORA-{code:05}: {message}")]
pub struct NativeError {
    /// Oracle error number
    pub code: i64,
    /// Oracle error text
    pub message: String,
}

impl NativeError {
    /// Create a native error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Opens sessions on the native client.
pub trait NativeDriver {
    /// Open a session; `persistent` asks the client for a cached session
    /// that outlives this connection object.
    fn connect(
        &self,
        dsn: &str,
        username: &str,
        password: &str,
        persistent: bool,
    ) -> Result<Box<dyn NativeConnection>, NativeError>;
}

/// A native database session.
pub trait NativeConnection: fmt::Debug {
    /// Parse a statement with named placeholders
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn NativeStatement>, NativeError>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<(), NativeError>;

    /// Roll back the open transaction
    fn rollback(&mut self) -> Result<(), NativeError>;

    /// Whether the session is still usable
    fn is_live(&self) -> bool;

    /// Close the session
    fn close(&mut self);

    /// Server version banner, when the client exposes one
    fn server_version(&self) -> Option<String> {
        None
    }
}

/// A native prepared statement.
pub trait NativeStatement: fmt::Debug {
    /// Bind `value` to the placeholder `name`
    fn bind_by_name(
        &mut self,
        name: &str,
        value: &Value,
        native_type: OracleType,
        max_length: i64,
    ) -> Result<(), NativeError>;

    /// Execute under the given commit mode
    fn execute(&mut self, mode: ExecuteMode) -> Result<(), NativeError>;

    /// Next row of the result set, `None` once exhausted
    fn fetch_row(&mut self) -> Result<Option<Row>, NativeError>;

    /// All remaining rows, in order
    fn fetch_all(&mut self) -> Result<Vec<Row>, NativeError>;

    /// Value the server wrote into an output placeholder during execute
    fn out_value(&self, name: &str) -> Option<Value>;

    /// Rows affected by the last execute (or fetched so far for queries)
    fn num_rows(&self) -> u64;

    /// Number of columns in the result set
    fn column_count(&self) -> usize;

    /// Describe a column (0-based)
    fn column_info(&self, index: usize) -> Option<ColumnInfo>;

    /// Whether the statement handle is still usable
    fn is_live(&self) -> bool;

    /// Free the statement handle
    fn free(&mut self);
}

/// A native resource that can be checked and released.
pub trait Releasable {
    /// Whether the resource is still live
    fn is_live(&self) -> bool;
    /// Release the resource
    fn release(&mut self);
}

impl Releasable for Box<dyn NativeConnection> {
    fn is_live(&self) -> bool {
        self.as_ref().is_live()
    }

    fn release(&mut self) {
        self.close();
    }
}

impl Releasable for Box<dyn NativeStatement> {
    fn is_live(&self) -> bool {
        self.as_ref().is_live()
    }

    fn release(&mut self) {
        self.free();
    }
}

/// Ownership state of a native handle
#[derive(Debug, Default)]
pub enum Handle<T> {
    /// The adapter owns this handle
    Open(T),
    /// Released, or never acquired
    #[default]
    Closed,
}

impl<T> Handle<T> {
    /// Wrap an acquired handle
    pub fn new(inner: T) -> Self {
        Handle::Open(inner)
    }

    /// Whether the adapter still owns the handle
    pub fn is_open(&self) -> bool {
        matches!(self, Handle::Open(_))
    }

    /// Borrow the handle
    pub fn get(&self) -> Option<&T> {
        match self {
            Handle::Open(inner) => Some(inner),
            Handle::Closed => None,
        }
    }

    /// Mutably borrow the handle
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Handle::Open(inner) => Some(inner),
            Handle::Closed => None,
        }
    }
}

impl<T: Releasable> Handle<T> {
    /// Release the handle if it is still a live resource.
    ///
    /// Always leaves the handle `Closed`. Returns whether a live resource was
    /// actually released; a dead or already released handle is a no-op.
    pub fn release(&mut self) -> bool {
        match std::mem::take(self) {
            Handle::Open(mut inner) if inner.is_live() => {
                inner.release();
                true
            }
            _ => false,
        }
    }

    /// Whether the handle is owned and the resource behind it is live
    pub fn is_live(&self) -> bool {
        self.get().map(Releasable::is_live).unwrap_or(false)
    }
}
