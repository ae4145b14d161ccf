//! SQL type classification and the column-type-string lookup.

use serde::{Deserialize, Serialize};

/// A general SQL value type.
///
/// Declared column type strings (e.g. `VARCHAR(100)`) map onto this closed
/// set for parameter typing; dialects map it back to native column type
/// names for DDL synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Boolean / BIT.
    Bool,
    /// 8-bit integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Exact decimal.
    Decimal,
    /// Character data.
    Text,
    /// Binary data.
    Bytes,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    Timestamp,
    /// UUID / GUID.
    Uuid,
}

impl SqlType {
    /// Map a declared column type string to a native parameter type.
    ///
    /// This is a fixed lookup over the type names the supported engines
    /// emit; a size suffix like `(100)` or `(10,2)` is ignored. Unrecognized
    /// strings return `None`, leaving the parameter's native type unset so
    /// the driver default applies.
    pub fn from_column_type(column_type: &str) -> Option<SqlType> {
        let base = column_type
            .split('(')
            .next()
            .unwrap_or(column_type)
            .trim()
            .to_ascii_uppercase();
        match base.as_str() {
            "BIT" | "BOOL" | "BOOLEAN" => Some(SqlType::Bool),
            "TINYINT" => Some(SqlType::TinyInt),
            "SMALLINT" | "INT2" => Some(SqlType::SmallInt),
            "INT" | "INTEGER" | "INT4" => Some(SqlType::Int),
            "BIGINT" | "INT8" => Some(SqlType::BigInt),
            "REAL" | "FLOAT4" => Some(SqlType::Float),
            "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Some(SqlType::Double),
            "DECIMAL" | "NUMERIC" | "MONEY" => Some(SqlType::Decimal),
            "CHAR" | "NCHAR" | "VARCHAR" | "NVARCHAR" | "TEXT" | "NTEXT" | "CLOB" => {
                Some(SqlType::Text)
            }
            "BINARY" | "VARBINARY" | "BLOB" | "BYTEA" | "IMAGE" => Some(SqlType::Bytes),
            "DATE" => Some(SqlType::Date),
            "TIME" => Some(SqlType::Time),
            "DATETIME" | "DATETIME2" | "SMALLDATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => {
                Some(SqlType::Timestamp)
            }
            "UNIQUEIDENTIFIER" | "UUID" | "GUID" => Some(SqlType::Uuid),
            _ => None,
        }
    }
}

/// Size/precision hints for rendering a native column type name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeHint {
    /// Character or byte length for sized types.
    pub size: Option<u32>,
    /// Total digits for decimal types.
    pub precision: Option<u8>,
    /// Digits after the decimal point.
    pub scale: Option<u8>,
}

impl TypeHint {
    /// No hints; the dialect picks its defaults.
    pub fn none() -> Self {
        Self::default()
    }

    /// A length hint for sized character/binary types.
    pub fn sized(size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Precision and scale for decimal types.
    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            size: None,
        }
    }
}
