use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// A submitted value the input controls should never have let through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("unknown {field} code {code:?}")]
    UnknownCode { field: &'static str, code: String },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number, got {value:?}")]
    Malformed { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parsed but was not trained on the expected schema.
    #[error("incompatible model artifact: {0}")]
    Incompatible(String),

    /// A request the loaded artifact cannot score.
    #[error("feature vector does not match the trained schema: {0}")]
    SchemaMismatch(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),

    #[error("HOST must be an IP address, got {0:?}")]
    InvalidAddr(String),
}

/// Why a single "Predict" action produced no result.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictError {
    pub fn status(&self) -> StatusCode {
        match self {
            PredictError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
