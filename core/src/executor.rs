//! Executing planned requests.
//!
//! The core never opens a socket on its own; anything that can turn an
//! `HttpRequest` into an `HttpResponse` can drive it. `UreqExecutor` is the
//! blocking implementation shipped behind the `ureq` feature.

use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::http::HttpResponse;

/// Performs the I/O for a planned request.
///
/// Implementations return non-2xx responses as data; only failures that
/// produced no response at all are errors.
pub trait Executor {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqExecutor;

#[cfg(feature = "ureq")]
mod blocking {
    use tracing::warn;

    use super::Executor;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking executor backed by a shared `ureq::Agent`.
    #[derive(Clone)]
    pub struct UreqExecutor {
        agent: ureq::Agent,
    }

    impl Default for UreqExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl UreqExecutor {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Executor for UreqExecutor {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let timeout_ms = request
                .timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0);

            let result = match request.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(&request.url);
                    for (key, value) in &request.headers {
                        builder = builder.header(key, value);
                    }
                    builder
                        .config()
                        .timeout_global(request.timeout)
                        .build()
                        .call()
                }
                HttpMethod::Post => {
                    let mut builder = self.agent.post(&request.url);
                    for (key, value) in &request.headers {
                        builder = builder.header(key, value);
                    }
                    let body = request.body.as_deref().unwrap_or_default();
                    builder
                        .config()
                        .timeout_global(request.timeout)
                        .build()
                        .send(body.as_bytes())
                }
            };

            let mut response = result.map_err(|e| match e {
                ureq::Error::Timeout(_) => {
                    warn!(url = %request.url, timeout_ms, "request timed out");
                    ApiError::Timeout { timeout_ms }
                }
                other => ApiError::Transport(other.to_string()),
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| match e {
                    ureq::Error::Timeout(_) => ApiError::Timeout { timeout_ms },
                    other => ApiError::Transport(other.to_string()),
                })?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
