//! Database connections
//!
//! A [`Connection`] owns one native session and the state shared with every
//! [`Statement`] it prepares: the execute mode, the transaction flag and the
//! attribute store.
//!
//! # Example
//!
//! ```rust
//! use oracle_adapter::mock::MockDriver;
//! use oracle_adapter::{Config, Connection, ParamId, Value};
//!
//! # fn example() -> oracle_adapter::Result<()> {
//! let driver = MockDriver::new();
//! let conn = Connection::open(&driver, "localhost:1521/FREEPDB1", "scott", "tiger", Config::default())?;
//!
//! conn.begin_transaction()?;
//! let mut stmt = conn.prepare("insert into logs (msg) values (?)", &[])?;
//! stmt.execute(Some(&[(ParamId::from(0usize), Value::from("hello"))]))?;
//! conn.commit()?;
//! assert!(!conn.in_transaction());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Thread Safety
//!
//! `Connection` and `Statement` are neither `Send` nor `Sync`. Use one
//! connection per thread.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::Config;
use crate::constants::{Attribute, ErrorMode, ExecuteMode, FetchMode, DRIVER_NAME};
use crate::driver::{Handle, NativeConnection, NativeDriver};
use crate::error::{Error, ErrorInfo, Result};
use crate::row::Value;
use crate::statement::Statement;
use crate::translate::translate;

/// State shared between a connection and its statements
pub(crate) struct ConnectionInner {
    pub(crate) native: Handle<Box<dyn NativeConnection>>,
    pub(crate) config: Config,
    pub(crate) in_transaction: bool,
    pub(crate) execute_mode: ExecuteMode,
    pub(crate) error: ErrorInfo,
}

impl ConnectionInner {
    pub(crate) fn is_open(&self) -> bool {
        self.native.is_open()
    }

    fn record(&mut self, info: ErrorInfo) {
        if self.config.error_mode == ErrorMode::Warning {
            tracing::warn!(sqlstate = %info.sqlstate, code = ?info.code, message = ?info.message, "Connection operation failed");
        }
        self.error = info;
    }
}

/// A connection to an Oracle database through the native client
pub struct Connection {
    inner: Rc<RefCell<ConnectionInner>>,
    id: u32,
}

// Connection ID counter
static CONNECTION_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

impl Connection {
    /// Open a session through `driver`.
    ///
    /// The session is persistent when `config.persistent` is set. A native
    /// failure is [`Error::ConnectFailed`].
    pub fn open(
        driver: &dyn NativeDriver,
        dsn: &str,
        username: &str,
        password: &str,
        config: Config,
    ) -> Result<Self> {
        let native = driver
            .connect(dsn, username, password, config.persistent)
            .map_err(|e| Error::ConnectFailed {
                code: Some(e.code),
                message: e.message,
            })?;
        tracing::debug!(dsn, persistent = config.persistent, "Opened native session");
        Self::new(native, config)
    }

    /// Wrap an open native session.
    ///
    /// Fails with [`Error::InvalidResource`] when the session is not live.
    pub fn new(native: Box<dyn NativeConnection>, config: Config) -> Result<Self> {
        if !native.is_live() {
            return Err(Error::InvalidResource(
                "native connection handle is not live".to_string(),
            ));
        }
        let id = CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let inner = ConnectionInner {
            native: Handle::new(native),
            config,
            in_transaction: false,
            execute_mode: ExecuteMode::CommitOnSuccess,
            error: ErrorInfo::default(),
        };
        Ok(Connection {
            inner: Rc::new(RefCell::new(inner)),
            id,
        })
    }

    pub(crate) fn inner(&self) -> Rc<RefCell<ConnectionInner>> {
        Rc::clone(&self.inner)
    }

    /// Get the connection ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Check if the connection is closed
    pub fn is_closed(&self) -> bool {
        !self.inner.borrow().is_open()
    }

    /// Release the native session. Closing twice is a no-op.
    ///
    /// Statements prepared on this connection fail with
    /// [`Error::ConnectionClosed`] afterwards.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.native.release() {
            tracing::debug!(id = self.id, "Closed native session");
        }
        inner.in_transaction = false;
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Prepare a statement.
    ///
    /// `?` placeholders are rewritten to `:0`, `:1`, ... before the native
    /// prepare. `options` become statement attributes.
    pub fn prepare(&self, sql: &str, options: &[(Attribute, Value)]) -> Result<Statement> {
        self.begin_operation()?;
        let translated = translate(sql);
        tracing::trace!(sql, translated = &*translated.sql, "Preparing statement");

        let prepared = match self.inner.borrow_mut().native.get_mut() {
            Some(native) => native.prepare(&translated.sql),
            None => return Err(Error::ConnectionClosed),
        };
        let native = prepared.map_err(|e| {
            self.fail(Error::InvalidResource(format!("prepare failed: {}", e)))
        })?;

        Statement::from_parts(
            native,
            self.inner(),
            sql.to_string(),
            translated.sql.into_owned(),
            translated.placeholders,
            options,
        )
        .map_err(|e| self.fail(e))
    }

    /// Prepare and execute `sql` without parameters.
    ///
    /// Returns the affected row count, or `Ok(None)` with the error triple
    /// set when execution fails.
    pub fn exec(&self, sql: &str) -> Result<Option<u64>> {
        let mut stmt = self.prepare(sql, &[])?;
        if stmt.execute(None)? {
            Ok(Some(stmt.row_count()))
        } else {
            self.inner.borrow_mut().record(stmt.error_info());
            Ok(None)
        }
    }

    /// Prepare and execute `sql`, returning the statement to fetch from.
    ///
    /// Returns `Ok(None)` with the error triple set when execution fails.
    pub fn query(&self, sql: &str, mode: Option<FetchMode>) -> Result<Option<Statement>> {
        let mut stmt = self.prepare(sql, &[])?;
        if let Some(mode) = mode {
            stmt.set_fetch_mode(mode);
        }
        if stmt.execute(None)? {
            Ok(Some(stmt))
        } else {
            self.inner.borrow_mut().record(stmt.error_info());
            Ok(None)
        }
    }

    /// Not provided by the Oracle client; use a `RETURNING ... INTO` output
    /// parameter instead.
    pub fn last_insert_id(&self, _name: Option<&str>) -> Result<String> {
        Err(self.fail(Error::NotSupported("last_insert_id".to_string())))
    }

    /// Quoting is not supported; always `None`. Bind parameters instead.
    pub fn quote(&self, _value: &str, _param_type: i64) -> Option<String> {
        self.inner.borrow_mut().error.clear();
        None
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Start a transaction.
    ///
    /// Statements execute without auto-commit until [`Connection::commit`] or
    /// [`Connection::roll_back`].
    pub fn begin_transaction(&self) -> Result<bool> {
        self.begin_operation()?;
        let mut inner = self.inner.borrow_mut();
        if inner.in_transaction {
            let err = Error::AlreadyInTransaction;
            inner.record(err.to_info());
            return Err(err);
        }
        inner.execute_mode = ExecuteMode::NoAutoCommit;
        inner.in_transaction = true;
        tracing::debug!(id = self.id, "Transaction started");
        Ok(true)
    }

    /// Commit the open transaction.
    ///
    /// Returns `Ok(false)` when no transaction is open. A native failure is
    /// [`Error::CommitFailed`] and leaves the transaction open.
    pub fn commit(&self) -> Result<bool> {
        self.end_transaction(TxEnd::Commit)
    }

    /// Roll back the open transaction.
    ///
    /// Returns `Ok(false)` when no transaction is open. A native failure is
    /// [`Error::RollbackFailed`] and leaves the transaction open.
    pub fn roll_back(&self) -> Result<bool> {
        self.end_transaction(TxEnd::Rollback)
    }

    fn end_transaction(&self, end: TxEnd) -> Result<bool> {
        self.begin_operation()?;
        let mut inner = self.inner.borrow_mut();
        if !inner.in_transaction {
            return Ok(false);
        }

        let result = match inner.native.get_mut() {
            Some(native) => match end {
                TxEnd::Commit => native.commit(),
                TxEnd::Rollback => native.rollback(),
            },
            None => return Err(Error::ConnectionClosed),
        };

        if let Err(e) = result {
            let err = match end {
                TxEnd::Commit => Error::CommitFailed {
                    code: Some(e.code),
                    message: e.message,
                },
                TxEnd::Rollback => Error::RollbackFailed {
                    code: Some(e.code),
                    message: e.message,
                },
            };
            inner.record(err.to_info());
            return Err(err);
        }

        inner.execute_mode = ExecuteMode::CommitOnSuccess;
        inner.in_transaction = false;
        tracing::debug!(id = self.id, end = ?end, "Transaction ended");
        Ok(true)
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.inner.borrow().in_transaction
    }

    /// Commit mode applied to every execute
    pub fn execute_mode(&self) -> ExecuteMode {
        self.inner.borrow().execute_mode
    }

    /// Switch between auto-commit and no-auto-commit, returning the new mode
    pub fn flip_execute_mode(&self) -> ExecuteMode {
        let mut inner = self.inner.borrow_mut();
        inner.execute_mode = inner.execute_mode.flipped();
        inner.execute_mode
    }

    /// Set the execute mode from its raw value (`0x00` or `0x20`)
    pub fn set_execute_mode(&self, raw: u32) -> Result<()> {
        let mode = ExecuteMode::try_from(raw).map_err(|e| self.fail(e))?;
        self.inner.borrow_mut().execute_mode = mode;
        Ok(())
    }

    // =========================================================================
    // Attributes and errors
    // =========================================================================

    /// Read a connection attribute
    pub fn get_attribute(&self, attr: Attribute) -> Option<Value> {
        let inner = self.inner.borrow();
        match attr {
            Attribute::DriverName => Some(Value::from(DRIVER_NAME)),
            Attribute::ServerVersion => inner
                .native
                .get()
                .and_then(|n| n.server_version())
                .map(Value::from),
            Attribute::ConnectionStatus => Some(Value::from(if inner.is_open() {
                "connected"
            } else {
                "closed"
            })),
            _ => inner.config.get(attr),
        }
    }

    /// Set a connection attribute.
    ///
    /// Read-only attributes return `Ok(false)`; invalid values for recognized
    /// attributes are [`Error::InvalidArgument`]. A new case or NULL mode
    /// applies to the next fetch on every statement.
    pub fn set_attribute(&self, attr: Attribute, value: Value) -> Result<bool> {
        self.inner.borrow_mut().error.clear();
        if matches!(
            attr,
            Attribute::DriverName
                | Attribute::ServerVersion
                | Attribute::ClientVersion
                | Attribute::ServerInfo
                | Attribute::ConnectionStatus
        ) {
            return Ok(false);
        }
        let result = self.inner.borrow_mut().config.set(attr, value);
        result.map_err(|e| self.fail(e))?;
        Ok(true)
    }

    /// Server version banner
    pub fn server_version(&self) -> Option<String> {
        self.inner
            .borrow()
            .native
            .get()
            .and_then(|n| n.server_version())
    }

    /// Whether the session was opened as persistent
    pub fn is_persistent(&self) -> bool {
        self.inner.borrow().config.persistent
    }

    /// SQLSTATE of the last operation
    pub fn error_code(&self) -> String {
        self.inner.borrow().error.sqlstate.clone()
    }

    /// Error triple of the last operation
    pub fn error_info(&self) -> ErrorInfo {
        self.inner.borrow().error.clone()
    }

    fn begin_operation(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.error.clear();
        if !inner.is_open() {
            let err = Error::ConnectionClosed;
            inner.record(err.to_info());
            return Err(err);
        }
        Ok(())
    }

    fn fail(&self, err: Error) -> Error {
        self.inner.borrow_mut().record(err.to_info());
        err
    }
}

#[derive(Debug, Clone, Copy)]
enum TxEnd {
    Commit,
    Rollback,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &inner.is_open())
            .field("in_transaction", &inner.in_transaction)
            .field("execute_mode", &inner.execute_mode)
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
