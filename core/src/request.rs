//! Merges per-call parameters with library configuration.
//!
//! # Design
//! The call's own fields are kept as a JSON map and the library-owned fields
//! (`user`, `log`, `t_client`) are typed. Reserved keys are removed from the
//! map before serialization so the payload never carries duplicates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{ApiError, ParamOrigin};
use crate::types::{ApiRequest, User};

/// Highest `t_client` handed out so far; keeps timestamps non-decreasing
/// when the wall clock steps backwards.
static LAST_T_CLIENT: AtomicU64 = AtomicU64::new(0);

/// The flat payload sent to the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedRequest {
    #[serde(flatten)]
    pub params: Map<String, Value>,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,
    pub t_client: u64,
}

/// Merge `request` with `config` and stamp the call time.
///
/// The request's `user` wins over the config's. `log` comes from the config
/// when set there.
pub fn extend_request<R: ApiRequest>(request: &R, config: &Config) -> Result<ExtendedRequest, ApiError> {
    let user = match (request.user(), config.user.as_ref()) {
        (Some(user), _) => user.validate(ParamOrigin::Request)?,
        (None, Some(user)) => user.validate(ParamOrigin::Config)?,
        (None, None) => return Err(ApiError::MissingUser),
    };

    let mut params = match serde_json::to_value(request)
        .map_err(|e| ApiError::SerializationError(e.to_string()))?
    {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    params.remove("user");
    params.remove("t_client");
    if config.log.is_some() {
        params.remove("log");
    }

    Ok(ExtendedRequest {
        params,
        user,
        log: config.log,
        t_client: now_millis(),
    })
}

/// Milliseconds since the Unix epoch, never lower than a previous result.
pub fn now_millis() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    let previous = LAST_T_CLIENT.fetch_max(now, Ordering::Relaxed);
    previous.max(now)
}
