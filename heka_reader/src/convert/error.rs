use std::fmt;

use thiserror::Error;

use crate::bundle::BundleError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown clamp mode: {0}")]
    UnknownClampMode(String),

    #[error("cannot infer clamp mode from unit {0:?}")]
    UnknownUnit(String),

    #[error("cannot encode description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export sink failed: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub fn validation(details: impl fmt::Display) -> Self {
        Self::Validation(details.to_string())
    }

    pub fn sink(details: impl fmt::Display) -> Self {
        Self::Sink(details.to_string())
    }
}
