//! Custom error types for the shp-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum ShpError {
    /// An error originating from I/O operations while loading a dataset.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// Serializing decoded output to JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is structurally invalid and does not conform to the file format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A read would run past the end of the buffer.
    #[error("Read out of bounds: {len} bytes at offset {offset}, but the buffer holds {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// The table declares a field type this reader does not decode.
    #[error("Field data type '{0}' is not supported")]
    UnsupportedFieldType(char),

    /// A recognized shape type that this reader does not decode.
    #[error("Shape type {code} ({name}) is not supported")]
    UnsupportedShapeType { code: u32, name: &'static str },

    /// A shape type code outside the format's defined set.
    #[error("Shape type {0} is unknown")]
    UnknownShapeType(u32),

    /// The geometry header declares a non-empty Z or M range.
    #[error("Shapefiles with a non-zero {0} range are not supported")]
    UnsupportedDimension(&'static str),

    /// Text could not be decoded (truncated or 4-byte UTF-8 sequence).
    #[error("UTF-8 decode failed: {0}")]
    UnsupportedEncoding(String),

    /// A caller-supplied record index is not a valid 1-based index.
    #[error("Record number {0} does not match any record")]
    InvalidIndex(usize),

    /// The attribute table and the geometry file hold a different number of records.
    #[error("Record count mismatch: table holds {expected} records, but geometry file holds {found}")]
    CountMismatch { expected: usize, found: usize },
}

/// A convenience `Result` type alias using the crate's `ShpError` type.
pub type Result<T> = std::result::Result<T, ShpError>;
