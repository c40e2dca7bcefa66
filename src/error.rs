//! Error types for model loading and per-request prediction

use actix_web::http::{header::ContentType, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use std::path::PathBuf;

use crate::templates;

/// Fatal errors raised while loading the model artifacts at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} has format version {found}, expected {expected}")]
    UnsupportedFormat {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    /// The vectorizer and classifier were not fitted together.
    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    Incompatible { vectorizer: usize, classifier: usize },
}

impl ModelLoadError {
    pub fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Per-request failures, converted to an HTTP error page at the handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("missing form field `{0}`")]
    MissingField(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("inference timed out after {0} ms")]
    Timeout(u64),
}

impl PredictError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal details stay in the log
        let detail = match self {
            Self::Inference(_) => "The classifier could not score this message.".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(templates::error_page(status, &detail))
    }
}
