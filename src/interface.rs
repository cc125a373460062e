//! Generic data-layer capability sets
//!
//! Code written against a generic connection/statement layer depends on these
//! traits rather than on [`Connection`] and [`Statement`] directly.

use crate::connection::Connection;
use crate::constants::{Attribute, FetchMode};
use crate::error::{ErrorInfo, Result};
use crate::row::{BindVar, FetchedRow, Value};
use crate::statement::{ColumnInfo, Statement};
use crate::translate::ParamId;

/// Connection capabilities
pub trait DbConnection {
    /// Statement type produced by this connection
    type Stmt: DbStatement;

    /// Prepare a statement
    fn prepare(&self, sql: &str, options: &[(Attribute, Value)]) -> Result<Self::Stmt>;

    /// Execute without parameters and return the affected row count
    fn exec(&self, sql: &str) -> Result<Option<u64>>;

    /// Prepare and execute, returning the statement to fetch from
    fn query(&self, sql: &str, mode: Option<FetchMode>) -> Result<Option<Self::Stmt>>;

    /// Start a transaction
    fn begin_transaction(&self) -> Result<bool>;

    /// Commit the open transaction
    fn commit(&self) -> Result<bool>;

    /// Roll back the open transaction
    fn roll_back(&self) -> Result<bool>;

    /// Whether a transaction is open
    fn in_transaction(&self) -> bool;

    /// Identifier of the last inserted row
    fn last_insert_id(&self, name: Option<&str>) -> Result<String>;

    /// Quote a string for literal inclusion
    fn quote(&self, value: &str, param_type: i64) -> Option<String>;

    /// Read an attribute
    fn get_attribute(&self, attr: Attribute) -> Option<Value>;

    /// Set an attribute
    fn set_attribute(&self, attr: Attribute, value: Value) -> Result<bool>;

    /// SQLSTATE of the last operation
    fn error_code(&self) -> String;

    /// Error triple of the last operation
    fn error_info(&self) -> ErrorInfo;
}

/// Statement capabilities
pub trait DbStatement {
    /// Bind a variable by reference
    fn bind_param(
        &mut self,
        param: ParamId,
        var: &BindVar,
        param_type: i64,
        max_length: i64,
    ) -> Result<bool>;

    /// Bind a value
    fn bind_value(&mut self, param: ParamId, value: Value, param_type: i64) -> Result<bool>;

    /// Bind a variable to a result column (1-based)
    fn bind_column(&mut self, column: i64, var: &BindVar, param_type: Option<i64>) -> Result<bool>;

    /// Execute
    fn execute(&mut self, params: Option<&[(ParamId, Value)]>) -> Result<bool>;

    /// Fetch the next row
    fn fetch(&mut self, mode: FetchMode) -> Result<Option<FetchedRow>>;

    /// Fetch every remaining row
    fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<FetchedRow>>;

    /// Fetch one cell of the next row
    fn fetch_column(&mut self, column: usize) -> Result<Option<Value>>;

    /// Describe a result column (0-based)
    fn column_meta(&self, column: usize) -> Option<ColumnInfo>;

    /// Affected or fetched row count
    fn row_count(&self) -> u64;

    /// Number of result columns
    fn column_count(&self) -> usize;

    /// SQLSTATE of the last operation
    fn error_code(&self) -> String;

    /// Error triple of the last operation
    fn error_info(&self) -> ErrorInfo;
}

impl DbConnection for Connection {
    type Stmt = Statement;

    fn prepare(&self, sql: &str, options: &[(Attribute, Value)]) -> Result<Statement> {
        Connection::prepare(self, sql, options)
    }

    fn exec(&self, sql: &str) -> Result<Option<u64>> {
        Connection::exec(self, sql)
    }

    fn query(&self, sql: &str, mode: Option<FetchMode>) -> Result<Option<Statement>> {
        Connection::query(self, sql, mode)
    }

    fn begin_transaction(&self) -> Result<bool> {
        Connection::begin_transaction(self)
    }

    fn commit(&self) -> Result<bool> {
        Connection::commit(self)
    }

    fn roll_back(&self) -> Result<bool> {
        Connection::roll_back(self)
    }

    fn in_transaction(&self) -> bool {
        Connection::in_transaction(self)
    }

    fn last_insert_id(&self, name: Option<&str>) -> Result<String> {
        Connection::last_insert_id(self, name)
    }

    fn quote(&self, value: &str, param_type: i64) -> Option<String> {
        Connection::quote(self, value, param_type)
    }

    fn get_attribute(&self, attr: Attribute) -> Option<Value> {
        Connection::get_attribute(self, attr)
    }

    fn set_attribute(&self, attr: Attribute, value: Value) -> Result<bool> {
        Connection::set_attribute(self, attr, value)
    }

    fn error_code(&self) -> String {
        Connection::error_code(self)
    }

    fn error_info(&self) -> ErrorInfo {
        Connection::error_info(self)
    }
}

impl DbStatement for Statement {
    fn bind_param(
        &mut self,
        param: ParamId,
        var: &BindVar,
        param_type: i64,
        max_length: i64,
    ) -> Result<bool> {
        Statement::bind_param(self, param, var, param_type, max_length, None)
    }

    fn bind_value(&mut self, param: ParamId, value: Value, param_type: i64) -> Result<bool> {
        Statement::bind_value(self, param, value, param_type)
    }

    fn bind_column(&mut self, column: i64, var: &BindVar, param_type: Option<i64>) -> Result<bool> {
        Statement::bind_column(self, column, var, param_type, 0, None)
    }

    fn execute(&mut self, params: Option<&[(ParamId, Value)]>) -> Result<bool> {
        Statement::execute(self, params)
    }

    fn fetch(&mut self, mode: FetchMode) -> Result<Option<FetchedRow>> {
        Statement::fetch(self, mode)
    }

    fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<FetchedRow>> {
        Statement::fetch_all(self, mode)
    }

    fn fetch_column(&mut self, column: usize) -> Result<Option<Value>> {
        Statement::fetch_column(self, column)
    }

    fn column_meta(&self, column: usize) -> Option<ColumnInfo> {
        Statement::column_meta(self, column)
    }

    fn row_count(&self) -> u64 {
        Statement::row_count(self)
    }

    fn column_count(&self) -> usize {
        Statement::column_count(self)
    }

    fn error_code(&self) -> String {
        Statement::error_code(self).to_string()
    }

    fn error_info(&self) -> ErrorInfo {
        Statement::error_info(self)
    }
}
