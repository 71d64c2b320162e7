//! Error types for the inventory analysis engine

use rust_decimal::Decimal;
use thiserror::Error;

/// A single input row that cannot be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("product_id is empty")]
    MissingProductId,

    #[error("{field} is not a number: '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} cannot be negative: {value}")]
    Negative { field: &'static str, value: Decimal },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: Decimal },

    #[error("duplicate product_id '{0}' in upload")]
    DuplicateProduct(String),

    #[error("row is not valid UTF-8 text")]
    InvalidEncoding,
}

/// Header problems that reject a whole upload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("File has no header row")]
    NoHeader,
}

impl ColumnError {
    /// Names of the missing columns, if any
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ColumnError::MissingRequired(columns) => columns,
            ColumnError::NoHeader => &[],
        }
    }
}

/// Persistence failures raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}
