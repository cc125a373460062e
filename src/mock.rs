//! Scripted in-memory native client
//!
//! Implements the [`crate::driver`] traits without a server. A test scripts
//! the result rows, output values and failures it wants through the shared
//! [`MockState`], runs adapter code, then inspects what the adapter asked the
//! client to do (binds, execute modes, commits, releases).
//!
//! ```rust
//! use oracle_adapter::mock::MockDriver;
//! use oracle_adapter::{Config, Connection, FetchMode, Row};
//!
//! let driver = MockDriver::new();
//! driver.state().borrow_mut().rows = vec![Row::from_pairs([("ID", 1)])];
//!
//! let conn = Connection::open(&driver, "localhost/FREEPDB1", "scott", "tiger", Config::default()).unwrap();
//! let mut stmt = conn.query("select id from t", None).unwrap().unwrap();
//! let row = stmt.fetch(FetchMode::Assoc).unwrap().unwrap();
//! assert_eq!(row.get("id").and_then(|v| v.as_i64()), Some(1));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::constants::{ExecuteMode, OracleType};
use crate::driver::{NativeConnection, NativeDriver, NativeError, NativeStatement};
use crate::row::{Row, Value};
use crate::statement::ColumnInfo;

/// A bind the adapter passed to the client
#[derive(Debug, Clone, PartialEq)]
pub struct MockBind {
    /// Placeholder name
    pub name: String,
    /// Bound value
    pub value: Value,
    /// Native type
    pub native_type: OracleType,
    /// Max length
    pub max_length: i64,
}

/// Script and recording shared by every handle the driver hands out.
#[derive(Debug, Default)]
pub struct MockState {
    // Script
    /// Fail the next connect
    pub fail_connect: Option<NativeError>,
    /// Fail every prepare
    pub fail_prepare: Option<NativeError>,
    /// Fail every bind
    pub fail_bind: Option<NativeError>,
    /// Fail every execute
    pub fail_execute: Option<NativeError>,
    /// Fail every fetch
    pub fail_fetch: Option<NativeError>,
    /// Fail every commit
    pub fail_commit: Option<NativeError>,
    /// Fail every rollback
    pub fail_rollback: Option<NativeError>,
    /// Rows each executed statement returns
    pub rows: Vec<Row>,
    /// Column descriptions for the result set
    pub columns: Vec<ColumnInfo>,
    /// Values written into output placeholders by execute
    pub out_values: HashMap<String, Value>,
    /// Affected row count reported after execute
    pub affected_rows: u64,
    /// Server banner
    pub server_version: Option<String>,

    // Recording
    /// `(dsn, persistent)` for each connect
    pub connects: Vec<(String, bool)>,
    /// Text of every prepared statement
    pub prepared: Vec<String>,
    /// Every bind, in order
    pub binds: Vec<MockBind>,
    /// `(sql, mode)` for every execute
    pub executions: Vec<(String, ExecuteMode)>,
    /// Successful commits
    pub commits: usize,
    /// Successful rollbacks
    pub rollbacks: usize,
    /// Sessions closed
    pub connections_closed: usize,
    /// Statement handles freed
    pub statements_freed: usize,
}

impl MockState {
    /// Last bind recorded under `name`
    pub fn last_bind(&self, name: &str) -> Option<&MockBind> {
        self.binds.iter().rev().find(|b| b.name == name)
    }

    /// Mode of the most recent execute
    pub fn last_execute_mode(&self) -> Option<ExecuteMode> {
        self.executions.last().map(|(_, mode)| *mode)
    }
}

/// Shared handle to the script
pub type SharedState = Rc<RefCell<MockState>>;

/// Native driver over a [`MockState`]
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: SharedState,
}

impl MockDriver {
    /// Create a driver with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared script and recording
    pub fn state(&self) -> SharedState {
        Rc::clone(&self.state)
    }

    /// A live session without going through `connect`
    pub fn connection(&self) -> Box<dyn NativeConnection> {
        Box::new(MockConnection::new(self.state()))
    }
}

impl NativeDriver for MockDriver {
    fn connect(
        &self,
        dsn: &str,
        _username: &str,
        _password: &str,
        persistent: bool,
    ) -> Result<Box<dyn NativeConnection>, NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_connect.take() {
            return Err(err);
        }
        state.connects.push((dsn.to_string(), persistent));
        drop(state);
        Ok(self.connection())
    }
}

/// Session handed out by [`MockDriver`]
#[derive(Debug)]
pub struct MockConnection {
    state: SharedState,
    live: bool,
}

impl MockConnection {
    /// A live session
    pub fn new(state: SharedState) -> Self {
        Self { state, live: true }
    }

    /// A session that is already dead
    pub fn dead(state: SharedState) -> Self {
        Self { state, live: false }
    }
}

impl NativeConnection for MockConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn NativeStatement>, NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_prepare.clone() {
            return Err(err);
        }
        state.prepared.push(sql.to_string());
        Ok(Box::new(MockStatement::new(Rc::clone(&self.state), sql)))
    }

    fn commit(&mut self) -> Result<(), NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_commit.clone() {
            return Err(err);
        }
        state.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_rollback.clone() {
            return Err(err);
        }
        state.rollbacks += 1;
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn close(&mut self) {
        self.live = false;
        self.state.borrow_mut().connections_closed += 1;
    }

    fn server_version(&self) -> Option<String> {
        self.state.borrow().server_version.clone()
    }
}

/// Statement handed out by [`MockConnection`]
#[derive(Debug)]
pub struct MockStatement {
    state: SharedState,
    sql: String,
    cursor: VecDeque<Row>,
    fetched: u64,
    affected: u64,
    is_query: bool,
    live: bool,
}

impl MockStatement {
    fn new(state: SharedState, sql: &str) -> Self {
        let is_query = sql
            .trim_start()
            .get(..6)
            .map(|kw| kw.eq_ignore_ascii_case("select"))
            .unwrap_or(false);
        Self {
            state,
            sql: sql.to_string(),
            cursor: VecDeque::new(),
            fetched: 0,
            affected: 0,
            is_query,
            live: true,
        }
    }

    /// Text the statement was prepared with
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl NativeStatement for MockStatement {
    fn bind_by_name(
        &mut self,
        name: &str,
        value: &Value,
        native_type: OracleType,
        max_length: i64,
    ) -> Result<(), NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_bind.clone() {
            return Err(err);
        }
        state.binds.push(MockBind {
            name: name.to_string(),
            value: value.clone(),
            native_type,
            max_length,
        });
        Ok(())
    }

    fn execute(&mut self, mode: ExecuteMode) -> Result<(), NativeError> {
        let mut state = self.state.borrow_mut();
        state.executions.push((self.sql.clone(), mode));
        if let Some(err) = state.fail_execute.clone() {
            return Err(err);
        }
        self.cursor = state.rows.iter().cloned().collect();
        self.fetched = 0;
        self.affected = state.affected_rows;
        Ok(())
    }

    fn fetch_row(&mut self) -> Result<Option<Row>, NativeError> {
        if let Some(err) = self.state.borrow().fail_fetch.clone() {
            return Err(err);
        }
        let row = self.cursor.pop_front();
        if row.is_some() {
            self.fetched += 1;
        }
        Ok(row)
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, NativeError> {
        if let Some(err) = self.state.borrow().fail_fetch.clone() {
            return Err(err);
        }
        let rows: Vec<Row> = self.cursor.drain(..).collect();
        self.fetched += rows.len() as u64;
        Ok(rows)
    }

    fn out_value(&self, name: &str) -> Option<Value> {
        self.state.borrow().out_values.get(name).cloned()
    }

    fn num_rows(&self) -> u64 {
        if self.is_query {
            self.fetched
        } else {
            self.affected
        }
    }

    fn column_count(&self) -> usize {
        let state = self.state.borrow();
        if state.columns.is_empty() {
            state.rows.first().map(Row::len).unwrap_or(0)
        } else {
            state.columns.len()
        }
    }

    fn column_info(&self, index: usize) -> Option<ColumnInfo> {
        self.state.borrow().columns.get(index).cloned()
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn free(&mut self) {
        self.live = false;
        self.state.borrow_mut().statements_freed += 1;
    }
}
