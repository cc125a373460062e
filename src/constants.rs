//! Constants shared by the connection and statement layers
//!
//! Numeric values follow the generic data-layer conventions callers already
//! use (parameter tags, fetch styles, attribute keys) on one side, and the
//! native client's bind type codes on the other.

use crate::error::Error;

// =============================================================================
// Native Bind Types (SQLT_*)
// =============================================================================

/// Native bind type codes understood by the Oracle client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OracleType {
    /// Character string (SQLT_CHR)
    Varchar = 1,
    /// NUMBER
    Number = 2,
    /// Native signed integer (SQLT_INT)
    BinaryInteger = 3,
    /// LONG
    Long = 8,
    /// DATE
    Date = 12,
    /// RAW
    Raw = 23,
    /// Fixed-length CHAR
    Char = 96,
    /// BINARY_DOUBLE
    BinaryDouble = 101,
    /// REF CURSOR
    Cursor = 102,
    /// CLOB (OCI_B_CLOB)
    Clob = 112,
    /// BLOB (OCI_B_BLOB)
    Blob = 113,
    /// TIMESTAMP
    Timestamp = 180,
    /// BOOLEAN
    Boolean = 252,
}

impl OracleType {
    /// Check if this type is a LOB type
    pub fn is_lob(&self) -> bool {
        matches!(self, OracleType::Clob | OracleType::Blob)
    }

    /// Name reported in column metadata
    pub fn native_name(&self) -> &'static str {
        match self {
            OracleType::Varchar => "VARCHAR2",
            OracleType::Number => "NUMBER",
            OracleType::BinaryInteger => "BINARY_INTEGER",
            OracleType::Long => "LONG",
            OracleType::Date => "DATE",
            OracleType::Raw => "RAW",
            OracleType::Char => "CHAR",
            OracleType::BinaryDouble => "BINARY_DOUBLE",
            OracleType::Cursor => "REF CURSOR",
            OracleType::Clob => "CLOB",
            OracleType::Blob => "BLOB",
            OracleType::Timestamp => "TIMESTAMP",
            OracleType::Boolean => "BOOLEAN",
        }
    }
}

impl TryFrom<u16> for OracleType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OracleType::Varchar),
            2 => Ok(OracleType::Number),
            3 => Ok(OracleType::BinaryInteger),
            8 => Ok(OracleType::Long),
            12 => Ok(OracleType::Date),
            23 => Ok(OracleType::Raw),
            96 => Ok(OracleType::Char),
            101 => Ok(OracleType::BinaryDouble),
            102 => Ok(OracleType::Cursor),
            112 => Ok(OracleType::Clob),
            113 => Ok(OracleType::Blob),
            180 => Ok(OracleType::Timestamp),
            252 => Ok(OracleType::Boolean),
            _ => Err(Error::InvalidArgument(format!(
                "unknown native type code {}",
                value
            ))),
        }
    }
}

// =============================================================================
// Generic Parameter Type Tags
// =============================================================================

/// Generic parameter type tags accepted by the bind operations.
///
/// Tags are plain integers so callers can pass whatever their data layer
/// hands them; anything outside this table is rejected by the type map.
pub mod param {
    /// SQL NULL
    pub const NULL: i64 = 0;
    /// Integer
    pub const INT: i64 = 1;
    /// Character string
    pub const STR: i64 = 2;
    /// Large object
    pub const LOB: i64 = 3;
    /// Statement handle (no native mapping)
    pub const STMT: i64 = 4;
    /// Boolean
    pub const BOOL: i64 = 5;
    /// Flag marking an input/output parameter
    pub const INPUT_OUTPUT: i64 = 0x8000_0000;
}

/// Minimum buffer width given to legacy integer output parameters
pub const LEGACY_OUTPUT_MIN_LENGTH: i64 = 40;

// =============================================================================
// Fetch Styles
// =============================================================================

/// Row shapes a fetch can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i64)]
pub enum FetchMode {
    /// Lazy object (treated like `Both`)
    Lazy = 1,
    /// Column name keyed map
    Assoc = 2,
    /// Position keyed list
    Num = 3,
    /// Keyed by both position and name
    Both = 4,
    /// Anonymous object
    Obj = 5,
    /// Into bound columns only
    Bound = 6,
    /// Single column
    Column = 7,
    /// Object-like row
    #[default]
    Class = 8,
}

impl FetchMode {
    /// Create from the integer form used by generic callers
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(FetchMode::Lazy),
            2 => Some(FetchMode::Assoc),
            3 => Some(FetchMode::Num),
            4 => Some(FetchMode::Both),
            5 => Some(FetchMode::Obj),
            6 => Some(FetchMode::Bound),
            7 => Some(FetchMode::Column),
            8 => Some(FetchMode::Class),
            _ => None,
        }
    }
}

// =============================================================================
// Connection Attribute Values
// =============================================================================

/// Column-name case folding applied to fetched rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i64)]
pub enum CaseMode {
    /// Leave names as the driver returns them (upper case for Oracle)
    Natural = 0,
    /// Force upper case
    Upper = 1,
    /// Force lower case
    #[default]
    Lower = 2,
}

impl CaseMode {
    /// Create from integer form
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(CaseMode::Natural),
            1 => Some(CaseMode::Upper),
            2 => Some(CaseMode::Lower),
            _ => None,
        }
    }

    /// Fold a column name according to this mode
    pub fn fold(&self, name: &str) -> String {
        match self {
            CaseMode::Natural => name.to_string(),
            CaseMode::Upper => name.to_uppercase(),
            CaseMode::Lower => name.to_lowercase(),
        }
    }
}

/// NULL and empty-string conversion applied to fetched values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i64)]
pub enum NullMode {
    /// No conversion
    #[default]
    Natural = 0,
    /// Empty strings become NULL
    EmptyString = 1,
    /// NULL becomes an empty string
    ToString = 2,
}

impl NullMode {
    /// Create from integer form
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(NullMode::Natural),
            1 => Some(NullMode::EmptyString),
            2 => Some(NullMode::ToString),
            _ => None,
        }
    }
}

/// How failures are reported to the generic layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i64)]
pub enum ErrorMode {
    /// Record the error triple only
    Silent = 0,
    /// Record the triple and log a warning
    Warning = 1,
    /// Record the triple; the generic layer raises
    #[default]
    Exception = 2,
}

impl ErrorMode {
    /// Create from integer form
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(ErrorMode::Silent),
            1 => Some(ErrorMode::Warning),
            2 => Some(ErrorMode::Exception),
            _ => None,
        }
    }
}

/// Attribute keys for connections and statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
#[allow(missing_docs)]
pub enum Attribute {
    Autocommit = 0,
    Prefetch = 1,
    Timeout = 2,
    ErrorMode = 3,
    ServerVersion = 4,
    ClientVersion = 5,
    ServerInfo = 6,
    ConnectionStatus = 7,
    Case = 8,
    CursorName = 9,
    Cursor = 10,
    OracleNulls = 11,
    Persistent = 12,
    StatementClass = 13,
    FetchTableNames = 14,
    FetchCatalogNames = 15,
    DriverName = 16,
    StringifyFetches = 17,
    MaxColumnLen = 18,
    DefaultFetchMode = 19,
    EmulatePrepares = 20,
}

impl Attribute {
    /// Create from integer form
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Attribute::Autocommit),
            1 => Some(Attribute::Prefetch),
            2 => Some(Attribute::Timeout),
            3 => Some(Attribute::ErrorMode),
            4 => Some(Attribute::ServerVersion),
            5 => Some(Attribute::ClientVersion),
            6 => Some(Attribute::ServerInfo),
            7 => Some(Attribute::ConnectionStatus),
            8 => Some(Attribute::Case),
            9 => Some(Attribute::CursorName),
            10 => Some(Attribute::Cursor),
            11 => Some(Attribute::OracleNulls),
            12 => Some(Attribute::Persistent),
            13 => Some(Attribute::StatementClass),
            14 => Some(Attribute::FetchTableNames),
            15 => Some(Attribute::FetchCatalogNames),
            16 => Some(Attribute::DriverName),
            17 => Some(Attribute::StringifyFetches),
            18 => Some(Attribute::MaxColumnLen),
            19 => Some(Attribute::DefaultFetchMode),
            20 => Some(Attribute::EmulatePrepares),
            _ => None,
        }
    }
}

// =============================================================================
// Execute Modes
// =============================================================================

/// Commit behavior applied to every execute on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ExecuteMode {
    /// Leave the transaction open (OCI_NO_AUTO_COMMIT)
    NoAutoCommit = 0x00,
    /// Commit after each successful execute (OCI_COMMIT_ON_SUCCESS)
    #[default]
    CommitOnSuccess = 0x20,
}

impl ExecuteMode {
    /// The other mode
    pub fn flipped(self) -> Self {
        match self {
            ExecuteMode::CommitOnSuccess => ExecuteMode::NoAutoCommit,
            ExecuteMode::NoAutoCommit => ExecuteMode::CommitOnSuccess,
        }
    }
}

impl TryFrom<u32> for ExecuteMode {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ExecuteMode::NoAutoCommit),
            0x20 => Ok(ExecuteMode::CommitOnSuccess),
            _ => Err(Error::InvalidExecuteMode(value)),
        }
    }
}

/// Name the adapter reports for `DriverName`
pub const DRIVER_NAME: &str = "oci";
