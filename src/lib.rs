#![warn(missing_docs)]

//! # oracle-adapter
//!
//! Exposes an Oracle session through a generic connection/statement layer.
//!
//! The adapter does not speak the wire protocol. It sits between callers that
//! expect a generic data layer (positional `?` placeholders, integer type
//! tags, fetch styles, SQLSTATE error triples) and a native Oracle client that
//! binds by name and executes under an explicit commit mode.
//!
//! ## Features
//!
//! - **Placeholder translation** - `?` becomes `:0`, `:1`, ... in order
//! - **Typed binds** - generic type tags mapped to native bind types
//! - **Write-back slots** - output parameters and bound columns land in
//!   caller-owned [`BindVar`]s
//! - **Row shaping** - associative, positional, both, or object rows with
//!   column-name case folding
//! - **Transactions** - connection-wide execute mode, flipped by
//!   begin/commit/rollback
//! - **Pluggable client** - the native client sits behind [`driver`] traits;
//!   [`mock::MockDriver`] scripts it in memory
//!
//! ## Quick Start
//!
//! ```rust
//! use oracle_adapter::mock::MockDriver;
//! use oracle_adapter::{Config, Connection, FetchMode, Row};
//!
//! fn main() -> oracle_adapter::Result<()> {
//!     let driver = MockDriver::new();
//!     driver.state().borrow_mut().rows = vec![Row::from_pairs([
//!         ("FNAME", "Test"),
//!         ("LNAME", "Testerson"),
//!     ])];
//!
//!     let conn = Connection::open(&driver, "localhost:1521/FREEPDB1", "user", "password", Config::default())?;
//!     if let Some(mut stmt) = conn.query("SELECT fname, lname FROM users", None)? {
//!         while let Some(row) = stmt.fetch(FetchMode::Assoc)? {
//!             println!("{:?} {:?}", row.get("fname"), row.get("lname"));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Binding
//!
//! ```rust
//! use oracle_adapter::constants::param;
//! use oracle_adapter::mock::MockDriver;
//! use oracle_adapter::{BindVar, Config, Connection, Value};
//!
//! # fn example() -> oracle_adapter::Result<()> {
//! let driver = MockDriver::new();
//! driver.state().borrow_mut().out_values.insert(":1".into(), Value::Integer(42));
//!
//! let conn = Connection::open(&driver, "db", "user", "password", Config::default())?;
//! let mut stmt = conn.prepare("begin :1 := next_id(?); end;", &[])?;
//!
//! let new_id = BindVar::new(Value::Null);
//! stmt.bind_value(0usize, "orders", param::STR)?;
//! stmt.bind_param(":1", &new_id, param::INT | param::INPUT_OUTPUT, -1, None)?;
//! stmt.execute(None)?;
//! assert_eq!(new_id.get(), Value::Integer(42));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Transactions
//!
//! Every execute runs under the connection's execute mode. It starts as
//! commit-on-success; [`Connection::begin_transaction`] switches it to
//! no-auto-commit until [`Connection::commit`] or [`Connection::roll_back`]
//! switches it back.
//!
//! ## Errors
//!
//! Structural problems are returned as [`Error`]. Data-dependent outcomes (a
//! failed execute, an exhausted cursor, committing with nothing open) are
//! `Ok(false)` or `Ok(None)`; the SQLSTATE triple is then available from
//! `error_info()` on the connection or statement.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber.

pub mod config;
pub mod connection;
pub mod constants;
pub mod driver;
pub mod error;
pub mod interface;
pub mod mock;
pub mod row;
pub mod statement;
pub mod translate;
pub mod type_map;

// Re-export commonly used types
pub use config::Config;
pub use connection::Connection;
pub use constants::{Attribute, CaseMode, ErrorMode, ExecuteMode, FetchMode, NullMode, OracleType};
pub use driver::{Handle, NativeConnection, NativeDriver, NativeError, NativeStatement};
pub use error::{Error, ErrorInfo, Result};
pub use interface::{DbConnection, DbStatement};
pub use row::{BindVar, FetchedRow, Row, RowKey, RowObject, Value};
pub use statement::{ColumnBinding, ColumnInfo, Rows, Statement};
pub use translate::{ParamId, Translated};

// Re-export serde_json for users converting rows to JSON
pub use serde_json;
