use std::{fmt, io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error: {0}")]
    Read(#[from] io::Error),

    #[error("schema {schema} declares {required} bytes but packs to {little} (little) / {big} (big)")]
    SchemaSizeMismatch {
        schema: &'static str,
        required: usize,
        little: usize,
        big: usize,
    },

    #[error("cannot detect byte order of {location} at offset {offset}: found {found:?}")]
    EndianDetectionFailure {
        location: String,
        offset: u64,
        found: Vec<u8>,
    },

    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: usize,
        available: usize,
    },

    #[error("invalid tree in {extension} at offset {offset}: {reason}")]
    InvalidTree {
        extension: &'static str,
        offset: u64,
        reason: String,
    },

    #[error("unsupported data format {code} for samples at offset {offset}")]
    UnsupportedDataFormat { code: u8, offset: i64 },

    #[error("invalid trace: {0}")]
    InvalidTrace(String),

    #[error("record {record} has no field {field}")]
    FieldMissing { record: &'static str, field: String },

    #[error("field {record}.{field} is not {expected}")]
    FieldType {
        record: &'static str,
        field: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, BundleError>;

impl BundleError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_tree(extension: &'static str, offset: u64, reason: impl fmt::Display) -> Self {
        Self::InvalidTree {
            extension,
            offset,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_trace(details: impl fmt::Display) -> Self {
        Self::InvalidTrace(details.to_string())
    }
}
