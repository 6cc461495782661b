//! Failure taxonomy at the HTTP boundary.
//!
//! Every failure leaving the gateway is a gRPC [`Status`]. This module maps
//! its code to an HTTP status and renders the `{code, message, details}`
//! envelope. Setup-time failures are [`RegistryError`] and never reach a
//! client.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tonic::{Code, Status};

use crate::pattern::PatternError;

/// Rejected route registration. Raised while the mux is built.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("malformed path pattern `{pattern}`: {source}")]
    MalformedPattern {
        pattern: &'static str,
        #[source]
        source: PatternError,
    },

    #[error("{method} {pattern} ({rpc}) collides with {existing_pattern} ({existing_rpc})")]
    DuplicateRoute {
        method: http::Method,
        pattern: &'static str,
        rpc: &'static str,
        existing_pattern: &'static str,
        existing_rpc: &'static str,
    },

    #[error("binding of {rpc} does not match `{pattern}`: {reason}")]
    BindingMismatch {
        rpc: &'static str,
        pattern: &'static str,
        reason: String,
    },
}

/// HTTP status for a gRPC code.
#[must_use]
pub fn http_status_from_code(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        // Client closed request (nginx convention).
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
            StatusCode::BAD_REQUEST
        }
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::Unknown | Code::Internal | Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wire shape of an error response.
///
/// Only the numeric code and the status message are exposed; `details` is
/// always present and currently always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    pub details: Vec<serde_json::Value>,
}

impl From<&Status> for ErrorBody {
    fn from(status: &Status) -> Self {
        Self {
            code: i32::from(status.code()),
            message: status.message().to_owned(),
            details: Vec::new(),
        }
    }
}

impl ErrorBody {
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code,
            "message": self.message,
            "details": self.details,
        })
    }
}

/// Body written when even the error envelope cannot be encoded.
pub(crate) const FALLBACK_ERROR_BODY: &str =
    r#"{"code":13,"message":"failed to marshal error message"}"#;
