//! Error types for the Findify client.
//!
//! # Design
//! Validation failures (`MissingParam`, `MissingUser`, `MethodNotAllowed`)
//! are returned before any request is built, so the caller never pays for a
//! round-trip it cannot win. Everything that can only happen after the
//! request leaves the process lands in `Http`, `Timeout` or `Transport`.

use std::fmt;

use thiserror::Error;

use crate::config::{Environment, TransportMethod};

/// Where a missing parameter was expected to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamOrigin {
    /// Passed to an operation call.
    Request,
    /// Supplied once through `Config`.
    Config,
}

impl fmt::Display for ParamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamOrigin::Request => write!(f, "request"),
            ParamOrigin::Config => write!(f, "library config"),
        }
    }
}

/// Errors returned by `FindifyClient` and the dispatch helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required parameter was absent or empty.
    #[error("\"{name}\" param is required at {origin}")]
    MissingParam {
        name: &'static str,
        origin: ParamOrigin,
    },

    /// Neither the call nor the config carried a user identity.
    #[error("`user` param should be provided either at request or at library config")]
    MissingUser,

    /// The callback transport needs a browser-like host.
    #[error("{method} method is not allowed in {environment} environment")]
    MethodNotAllowed {
        method: TransportMethod,
        environment: Environment,
    },

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The callback transport did not answer in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// True for errors raised before any I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApiError::MissingParam { .. } | ApiError::MissingUser | ApiError::MethodNotAllowed { .. }
        )
    }
}
