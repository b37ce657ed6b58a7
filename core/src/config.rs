//! Library configuration and its resolution into dispatch settings.
//!
//! # Design
//! `Config` is what the caller hands over once; `Settings` is the same data
//! with every default filled in. The environment that decides the default
//! transport is passed in explicitly instead of being probed at call time,
//! so `make_settings` stays a pure function.

use std::fmt;

use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ParamOrigin};
use crate::types::{string_or_scalar, UserParams};

/// Production API origin used when `Config::host` is not set.
pub const DEFAULT_HOST: &str = "https://api-v3.findify.io";

/// Prefix for generated callback names on the callback transport.
pub const DEFAULT_JSONP_CALLBACK_PREFIX: &str = "findifyCallback";

/// Prefix of the environment variables read by `Config::from_env`.
pub const ENV_PREFIX: &str = "FINDIFY_";

/// How a request reaches the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMethod {
    /// JSON body over `POST`.
    Post,
    /// Cross-origin `GET` answered by a script that invokes a named callback.
    Jsonp,
}

impl fmt::Display for TransportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMethod::Post => write!(f, "post"),
            TransportMethod::Jsonp => write!(f, "jsonp"),
        }
    }
}

/// The kind of host the client runs in.
///
/// `Browser` hosts have a global callback registry and can serve the
/// callback transport; `Server` hosts cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Server,
    Browser,
}

impl Environment {
    /// Environment implied by the compilation target.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Environment::Browser
        } else {
            Environment::Server
        }
    }

    /// Transport used when the config does not name one.
    pub fn default_method(self) -> TransportMethod {
        match self {
            Environment::Server => TransportMethod::Post,
            Environment::Browser => TransportMethod::Jsonp,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Server => write!(f, "server"),
            Environment::Browser => write!(f, "browser"),
        }
    }
}

/// Library-level configuration, captured once by `FindifyClient`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, deserialize_with = "string_or_scalar")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<TransportMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonp_callback_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,
}

impl Config {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_method(mut self, method: TransportMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_jsonp_callback_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.jsonp_callback_prefix = Some(prefix.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<UserParams>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = Some(log);
        self
    }

    /// Load configuration from `FINDIFY_*` environment variables.
    ///
    /// Nested fields use a double underscore: `FINDIFY_USER__UID`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::figment()
            .extract()
            .map_err(|e| ApiError::Config(e.to_string()))
    }

    /// The figment `from_env` extracts from, exposed so callers can layer
    /// their own providers on top.
    pub fn figment() -> Figment {
        Figment::new().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject configurations that could never authenticate a request.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.key.trim().is_empty() {
            return Err(ApiError::MissingParam {
                name: "key",
                origin: ParamOrigin::Config,
            });
        }
        Ok(())
    }
}

/// `Config` with every default resolved for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub key: String,
    pub host: String,
    pub method: TransportMethod,
    pub jsonp_callback_prefix: String,
}

/// Fill in defaults: production host, `findifyCallback` prefix, and the
/// environment's transport unless the config names one.
pub fn make_settings(config: &Config, environment: Environment) -> Settings {
    Settings {
        key: config.key.clone(),
        host: config
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        method: config
            .method
            .unwrap_or_else(|| environment.default_method()),
        jsonp_callback_prefix: config
            .jsonp_callback_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_JSONP_CALLBACK_PREFIX.to_string()),
    }
}
