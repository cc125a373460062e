//! Prepared statements
//!
//! A [`Statement`] owns one native prepared-statement handle for as long as it
//! lives, and shares its connection's state (execute mode, case folding, NULL
//! handling) to decide how to execute and how to shape fetched rows.
//!
//! Output parameters and bound columns are written back into caller-owned
//! [`BindVar`] slots: by-reference parameters after `execute`, bound columns
//! on every `fetch`.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::connection::{Connection, ConnectionInner};
use crate::constants::{param, Attribute, ErrorMode, FetchMode, OracleType};
use crate::driver::{Handle, NativeStatement};
use crate::error::{Error, ErrorInfo, Result};
use crate::row::{shape_row, BindVar, FetchedRow, Row, RowStyle, Value};
use crate::translate::{bind_name, translate, BoundParam, ParamId, ParamRegistry};
use crate::type_map;

/// Column metadata reported by the native client
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Oracle data type
    pub oracle_type: OracleType,
    /// Data type size
    pub data_size: u32,
    /// Precision (for NUMBER)
    pub precision: i16,
    /// Scale (for NUMBER)
    pub scale: i16,
    /// Whether NULL values are allowed
    pub nullable: bool,
}

impl ColumnInfo {
    /// Create a new column with minimal info
    pub fn new(name: impl Into<String>, oracle_type: OracleType) -> Self {
        Self {
            name: name.into(),
            oracle_type,
            data_size: 0,
            precision: 0,
            scale: 0,
            nullable: true,
        }
    }

    /// Set the data size
    pub fn with_size(mut self, data_size: u32) -> Self {
        self.data_size = data_size;
        self
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Generic parameter tag matching this column's type
    pub fn generic_type(&self) -> i64 {
        type_map::generic_tag_for(self.oracle_type)
    }

    /// Native type name
    pub fn native_type_name(&self) -> &'static str {
        self.oracle_type.native_name()
    }

    /// Check if this column is a LOB type
    pub fn is_lob(&self) -> bool {
        self.oracle_type.is_lob()
    }
}

/// A variable bound to a result column
#[derive(Debug, Clone)]
pub struct ColumnBinding {
    /// Slot overwritten on every fetch
    pub var: BindVar,
    /// Generic type tag
    pub data_type: i64,
    /// Max length as given
    pub max_length: i64,
    /// Driver-specific data as given
    pub driver_data: Option<Value>,
}

/// A prepared statement
pub struct Statement {
    conn: Rc<RefCell<ConnectionInner>>,
    native: Handle<Box<dyn NativeStatement>>,
    query_string: String,
    translated: String,
    placeholders: usize,
    params: ParamRegistry,
    /// By-reference slots, keyed by bind name, written back after execute
    out_vars: IndexMap<String, BindVar>,
    /// 1-based column ordinal to bound variable
    columns: IndexMap<usize, ColumnBinding>,
    attributes: IndexMap<Attribute, Value>,
    fetch_mode: FetchMode,
    /// Raw row from the most recent fetch
    result_buffer: Option<Row>,
    error: ErrorInfo,
}

impl Statement {
    /// Wrap a native prepared statement.
    ///
    /// `sql` is the query as the caller wrote it; the translated form is
    /// derived from it. Fails with [`Error::InvalidResource`] when the native
    /// handle is not live.
    pub fn new(
        native: Box<dyn NativeStatement>,
        conn: &Connection,
        sql: impl Into<String>,
        options: &[(Attribute, Value)],
    ) -> Result<Self> {
        let sql = sql.into();
        let translated = translate(&sql);
        let (text, placeholders) = (translated.sql.into_owned(), translated.placeholders);
        Self::from_parts(native, conn.inner(), sql, text, placeholders, options)
    }

    pub(crate) fn from_parts(
        native: Box<dyn NativeStatement>,
        conn: Rc<RefCell<ConnectionInner>>,
        query_string: String,
        translated: String,
        placeholders: usize,
        options: &[(Attribute, Value)],
    ) -> Result<Self> {
        if !native.is_live() {
            return Err(Error::InvalidResource(
                "native statement handle is not live".to_string(),
            ));
        }

        let fetch_mode = conn.borrow().config.default_fetch_mode;
        let mut stmt = Self {
            conn,
            native: Handle::new(native),
            query_string,
            translated,
            placeholders,
            params: ParamRegistry::new(),
            out_vars: IndexMap::new(),
            columns: IndexMap::new(),
            attributes: IndexMap::new(),
            fetch_mode,
            result_buffer: None,
            error: ErrorInfo::default(),
        };
        for (attr, value) in options {
            stmt.set_attribute(*attr, value.clone())?;
        }
        Ok(stmt)
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Bind a variable by reference.
    ///
    /// Ordinals are bound as `:{ordinal}`. The slot's current value is sent
    /// now and the slot is overwritten with the output value after each
    /// `execute`. The legacy `INT | INPUT_OUTPUT` tag binds as a string
    /// output of at least 40 characters.
    ///
    /// Returns `Ok(false)` when the native binder rejects the bind.
    pub fn bind_param(
        &mut self,
        param: impl Into<ParamId>,
        var: &BindVar,
        param_type: i64,
        max_length: i64,
        _driver_options: Option<Value>,
    ) -> Result<bool> {
        self.begin_operation()?;
        let name = bind_name(&param.into());
        let (native_type, max_length) = type_map::resolve_output_bind(param_type, max_length)
            .map_err(|e| self.fail(e))?;

        let value = var.get();
        self.params.register(
            name.clone(),
            value.clone(),
            true,
            param_type,
            native_type,
            max_length,
        );
        self.out_vars.insert(name.clone(), var.clone());

        self.bind_native(&name, &value, native_type, max_length)
    }

    /// Bind a value. Nothing is written back.
    pub fn bind_value(
        &mut self,
        param: impl Into<ParamId>,
        value: impl Into<Value>,
        param_type: i64,
    ) -> Result<bool> {
        self.begin_operation()?;
        let name = bind_name(&param.into());
        let native_type = type_map::resolve_strict(param_type).map_err(|e| self.fail(e))?;

        let value = value.into();
        self.params
            .register(name.clone(), value.clone(), false, param_type, native_type, -1);
        self.out_vars.shift_remove(&name);

        self.bind_native(&name, &value, native_type, -1)
    }

    /// Bind a variable to a result column (1-based).
    ///
    /// The variable receives the column's raw cell on every subsequent fetch.
    /// `param_type` defaults to `STR`.
    pub fn bind_column(
        &mut self,
        column: i64,
        var: &BindVar,
        param_type: Option<i64>,
        max_length: i64,
        driver_data: Option<Value>,
    ) -> Result<bool> {
        self.begin_operation()?;
        let ordinal = match usize::try_from(column) {
            Ok(ordinal) if ordinal >= 1 => ordinal,
            _ => {
                return Err(self.fail(Error::InvalidArgument(format!(
                    "column ordinal must be a positive integer, got {}",
                    column
                ))))
            }
        };
        let data_type = param_type.unwrap_or(param::STR);
        type_map::resolve_strict(data_type).map_err(|e| self.fail(e))?;

        self.columns.insert(
            ordinal,
            ColumnBinding {
                var: var.clone(),
                data_type,
                max_length,
                driver_data,
            },
        );
        Ok(true)
    }

    /// The binding registered for a column (1-based)
    pub fn column_binding(&self, column: usize) -> Option<&ColumnBinding> {
        self.columns.get(&column)
    }

    fn bind_native(
        &mut self,
        name: &str,
        value: &Value,
        native_type: OracleType,
        max_length: i64,
    ) -> Result<bool> {
        tracing::trace!(name, native_type = ?native_type, max_length, "Binding parameter");
        let bound = self
            .native_mut()?
            .bind_by_name(name, value, native_type, max_length);
        match bound {
            Ok(()) => Ok(true),
            Err(e) => {
                self.record(Error::Native(e).to_info());
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Execute
    // =========================================================================

    /// Execute the statement under the connection's current execute mode.
    ///
    /// Each supplied parameter is bound by reference into a fresh slot before
    /// execution. A native failure records `07000` and returns `Ok(false)`.
    pub fn execute(&mut self, params: Option<&[(ParamId, Value)]>) -> Result<bool> {
        self.begin_operation()?;

        if let Some(params) = params {
            for (id, value) in params {
                let slot = BindVar::new(value.clone());
                if !self.bind_param(id.clone(), &slot, param::STR, -1, None)? {
                    return Ok(false);
                }
            }
        }

        let mode = self.conn.borrow().execute_mode;
        tracing::trace!(sql = self.translated.as_str(), mode = ?mode, "Executing statement");
        let result = self.native_mut()?.execute(mode);

        if let Some(native) = self.native.get() {
            for (name, var) in &self.out_vars {
                if let Some(value) = native.out_value(name) {
                    var.set(value);
                }
            }
        }
        if let Some(row) = self.result_buffer.take() {
            self.write_bound_columns(&row);
        }

        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::trace!(error = %e, "Execute failed");
                self.record(ErrorInfo::no_result(Some(&e)));
                Ok(false)
            }
        }
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Fetch the next row.
    ///
    /// `Class` and `Assoc` fetch a name keyed row, `Num` a positional one and
    /// every other mode a row keyed both ways. Only `Class` turns the row into
    /// an object. Returns `Ok(None)` with `07000` recorded once the result set
    /// is exhausted or the native fetch fails.
    pub fn fetch(&mut self, mode: FetchMode) -> Result<Option<FetchedRow>> {
        self.begin_operation()?;
        self.fetch_mode = mode;

        let fetched = self.native_mut()?.fetch_row();
        let row = match fetched {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.record(ErrorInfo::no_result(None));
                return Ok(None);
            }
            Err(e) => {
                self.record(ErrorInfo::no_result(Some(&e)));
                return Ok(None);
            }
        };

        self.write_bound_columns(&row);
        self.result_buffer = Some(row.clone());
        Ok(Some(self.shape(row, row_style(mode))))
    }

    /// Fetch every remaining row. Only `Class` and `Assoc` are accepted.
    ///
    /// An empty or failed result set is an empty `Vec`.
    pub fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<FetchedRow>> {
        self.begin_operation()?;
        if !matches!(mode, FetchMode::Class | FetchMode::Assoc) {
            return Err(self.fail(Error::InvalidArgument(
                "only CLASS and ASSOC fetch modes are supported".to_string(),
            )));
        }
        self.fetch_mode = mode;

        let fetched = self.native_mut()?.fetch_all();
        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                self.record(ErrorInfo::no_result(Some(&e)));
                return Ok(Vec::new());
            }
        };
        tracing::trace!(rows = rows.len(), "Fetched all rows");

        Ok(rows
            .into_iter()
            .map(|row| self.shape(row, RowStyle::Assoc))
            .collect())
    }

    /// Fetch the next row positionally and return one cell (0-based)
    pub fn fetch_column(&mut self, column: usize) -> Result<Option<Value>> {
        Ok(self
            .fetch(FetchMode::Num)?
            .and_then(|row| row.get_index(column).cloned()))
    }

    /// Fetch the next row as an object.
    ///
    /// `class_name` and `ctor_args` are accepted for interface compatibility;
    /// the row is always the generic object shape.
    pub fn fetch_object(
        &mut self,
        _class_name: Option<&str>,
        _ctor_args: &[Value],
    ) -> Result<Option<FetchedRow>> {
        self.fetch(FetchMode::Class)
    }

    /// Iterate the remaining rows under the current fetch mode
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            stmt: self,
            done: false,
        }
    }

    /// Multiple result sets are not supported
    pub fn next_rowset(&mut self) -> Result<bool> {
        Err(self.fail(Error::NotSupported("next_rowset".to_string())))
    }

    fn write_bound_columns(&self, row: &Row) {
        for (position, value) in row.values().iter().enumerate() {
            if let Some(binding) = self.columns.get(&(position + 1)) {
                binding.var.set(value.clone());
            }
        }
    }

    fn shape(&self, row: Row, style: RowStyle) -> FetchedRow {
        let conn = self.conn.borrow();
        shape_row(
            row,
            style,
            conn.config.case,
            conn.config.oracle_nulls,
            self.fetch_mode == FetchMode::Class,
        )
    }

    // =========================================================================
    // Metadata and attributes
    // =========================================================================

    /// Rows affected by the last execute, or fetched so far for queries
    pub fn row_count(&self) -> u64 {
        self.native.get().map(|n| n.num_rows()).unwrap_or(0)
    }

    /// Number of columns in the result set
    pub fn column_count(&self) -> usize {
        self.native.get().map(|n| n.column_count()).unwrap_or(0)
    }

    /// Describe a result column (0-based)
    pub fn column_meta(&self, column: usize) -> Option<ColumnInfo> {
        self.native.get().and_then(|n| n.column_info(column))
    }

    /// Current fetch mode
    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Set the fetch mode used by [`Statement::rows`]
    pub fn set_fetch_mode(&mut self, mode: FetchMode) -> bool {
        self.fetch_mode = mode;
        true
    }

    /// Read a statement attribute
    pub fn get_attribute(&self, attr: Attribute) -> Option<Value> {
        match attr {
            Attribute::DefaultFetchMode => Some(Value::Integer(self.fetch_mode as i64)),
            _ => self.attributes.get(&attr).cloned(),
        }
    }

    /// Set a statement attribute
    pub fn set_attribute(&mut self, attr: Attribute, value: Value) -> Result<bool> {
        match attr {
            Attribute::DefaultFetchMode => {
                let mode = value.as_i64().and_then(FetchMode::from_i64).ok_or_else(|| {
                    self.fail(Error::InvalidArgument(format!("invalid fetch mode {}", value)))
                })?;
                self.fetch_mode = mode;
            }
            _ => {
                self.attributes.insert(attr, value);
            }
        }
        Ok(true)
    }

    /// Query text as submitted
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Query text with named placeholders
    pub fn translated_sql(&self) -> &str {
        &self.translated
    }

    /// Number of `?` placeholders in the submitted text
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Registered parameters in bind order
    pub fn params(&self) -> &[BoundParam] {
        self.params.entries()
    }

    /// Text dump of the query and the registered parameters
    pub fn debug_dump_params(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "SQL: [{}] {}", self.query_string.len(), self.query_string);
        let _ = writeln!(out, "Params:  {}", self.params.len());
        for p in self.params.entries() {
            let _ = writeln!(
                out,
                "Key: Name: [{}] {}\nparamno={}\nname=[{}] \"{}\"\nis_param={}\nparam_type={}\nvalue={}",
                p.name.len(),
                p.name,
                p.ordinal,
                p.name.len(),
                p.name,
                u8::from(p.by_ref),
                p.param_type,
                p.value,
            );
        }
        out
    }

    /// SQLSTATE of the last operation
    pub fn error_code(&self) -> &str {
        &self.error.sqlstate
    }

    /// Error triple of the last operation
    pub fn error_info(&self) -> ErrorInfo {
        self.error.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Reset the error triple and check both the connection and the native
    /// handle are usable.
    fn begin_operation(&mut self) -> Result<()> {
        self.error.clear();
        if !self.conn.borrow().is_open() {
            return Err(self.fail(Error::ConnectionClosed));
        }
        if !self.native.is_live() {
            return Err(self.fail(Error::InvalidResource(
                "statement handle has been released".to_string(),
            )));
        }
        Ok(())
    }

    fn native_mut(&mut self) -> Result<&mut Box<dyn NativeStatement>> {
        self.native.get_mut().ok_or_else(|| {
            Error::InvalidResource("statement handle has been released".to_string())
        })
    }

    fn record(&mut self, info: ErrorInfo) {
        if self.conn.borrow().config.error_mode == ErrorMode::Warning {
            tracing::warn!(sqlstate = %info.sqlstate, code = ?info.code, message = ?info.message, "Statement operation failed");
        }
        self.error = info;
    }

    fn fail(&mut self, err: Error) -> Error {
        self.record(err.to_info());
        err
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("query_string", &self.query_string)
            .field("translated", &self.translated)
            .field("params", &self.params.len())
            .field("fetch_mode", &self.fetch_mode)
            .field("open", &self.native.is_open())
            .finish()
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        if self.native.release() {
            tracing::debug!(sql = self.translated.as_str(), "Released statement handle");
        }
    }
}

fn row_style(mode: FetchMode) -> RowStyle {
    match mode {
        FetchMode::Class | FetchMode::Assoc => RowStyle::Assoc,
        FetchMode::Num => RowStyle::Num,
        _ => RowStyle::Both,
    }
}

/// Iterator over the remaining rows of a statement.
///
/// Ends after the result set is exhausted or after the first error.
pub struct Rows<'a> {
    stmt: &'a mut Statement,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<FetchedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mode = self.stmt.fetch_mode;
        let next = self.stmt.fetch(mode).transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

impl std::iter::FusedIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::mock::MockDriver;

    fn fixture_driver() -> MockDriver {
        let driver = MockDriver::new();
        driver.state().borrow_mut().rows = vec![Row::from_pairs([
            ("FNAME", "Test"),
            ("LNAME", "Testerson"),
            ("EMAIL", "tester@testing.com"),
        ])];
        driver
    }

    #[test]
    fn test_row_style_dispatch() {
        assert_eq!(row_style(FetchMode::Class), RowStyle::Assoc);
        assert_eq!(row_style(FetchMode::Assoc), RowStyle::Assoc);
        assert_eq!(row_style(FetchMode::Num), RowStyle::Num);
        assert_eq!(row_style(FetchMode::Lazy), RowStyle::Both);
        assert_eq!(row_style(FetchMode::Bound), RowStyle::Both);
    }

    #[test]
    fn test_new_derives_translation() {
        let driver = MockDriver::new();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let native = driver.connection().prepare("select 1 from dual").unwrap();
        let stmt = Statement::new(native, &conn, "select ? from dual", &[]).unwrap();
        assert_eq!(stmt.translated_sql(), "select :0 from dual");
        assert_eq!(stmt.placeholder_count(), 1);
        assert_eq!(stmt.fetch_mode(), FetchMode::Class);
    }

    #[test]
    fn test_dead_native_statement_rejected() {
        let driver = MockDriver::new();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let mut native = driver.connection().prepare("select 1 from dual").unwrap();
        native.free();
        let err = Statement::new(native, &conn, "select 1 from dual", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidResource(_)));
        assert_eq!(err.sqlstate(), Some("0A000"));
    }

    #[test]
    fn test_options_become_attributes() {
        let driver = MockDriver::new();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let stmt = conn
            .prepare(
                "select 1 from dual",
                &[
                    (Attribute::Prefetch, Value::Integer(50)),
                    (Attribute::DefaultFetchMode, Value::Integer(FetchMode::Num as i64)),
                ],
            )
            .unwrap();
        assert_eq!(stmt.get_attribute(Attribute::Prefetch), Some(Value::Integer(50)));
        assert_eq!(stmt.fetch_mode(), FetchMode::Num);
    }

    #[test]
    fn test_result_buffer_rewritten_into_columns_on_execute() {
        let driver = fixture_driver();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let mut stmt = conn.prepare("select * from people", &[]).unwrap();
        stmt.execute(None).unwrap();
        stmt.fetch(FetchMode::Assoc).unwrap();

        let email = BindVar::new(Value::Null);
        stmt.bind_column(3, &email, None, 0, None).unwrap();
        assert!(email.get().is_null());

        stmt.execute(None).unwrap();
        assert_eq!(email.get(), Value::from("tester@testing.com"));
    }

    #[test]
    fn test_debug_dump_lists_params() {
        let driver = MockDriver::new();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let mut stmt = conn.prepare("select * from t where id = ?", &[]).unwrap();
        stmt.bind_value(0usize, 7, param::INT).unwrap();
        let dump = stmt.debug_dump_params();
        assert!(dump.starts_with("SQL: [28] select * from t where id = ?"));
        assert!(dump.contains("Params:  1"));
        assert!(dump.contains("name=[2] \":0\""));
        assert!(dump.contains("value=7"));
    }

    #[test]
    fn test_rows_iterator_stops_at_end() {
        let driver = fixture_driver();
        let conn = Connection::new(driver.connection(), Config::default()).unwrap();
        let mut stmt = conn.query("select * from people", Some(FetchMode::Assoc)).unwrap().unwrap();
        let rows: Vec<_> = stmt.rows().collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(stmt.error_code(), "07000");
    }
}
