use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forms::{FieldError, StockField};

/// Text shown in place of a missing server detail.
pub const MISSING_DETAIL: &str = "undefined";

/// JSON body the API attaches to failed requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network Error")]
    Network(String),
    #[error("{}", status_text(.status))]
    Status {
        status: StatusCode,
        body: Option<ErrorBody>,
    },
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: StatusCode, detail: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            body: Some(ErrorBody {
                detail: Some(serde_json::Value::String(detail.into())),
            }),
        }
    }

    /// Server supplied `detail`, flattened to text. Structured details (e.g. a list of
    /// validation errors) come back as compact JSON.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Status {
                body: Some(ErrorBody { detail: Some(detail) }),
                ..
            } => match detail {
                serde_json::Value::String(text) => Some(text.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            },
            _ => None,
        }
    }

    pub fn detail_or_missing(&self) -> String {
        self.detail().unwrap_or_else(|| MISSING_DETAIL.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ApiError::Decode(value.to_string())
        } else {
            ApiError::Network(value.to_string())
        }
    }
}

fn status_text(status: &StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => status.canonical_reason().unwrap_or("Generic Error"),
    }
}

pub type FieldErrors = BTreeMap<StockField, FieldError>;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(FieldErrors),
    #[error("No changes to save")]
    Unchanged,
    #[error("A submission is already in flight")]
    InFlight,
    #[error(transparent)]
    Remote(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
