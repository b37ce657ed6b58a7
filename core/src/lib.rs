//! Client core for the Findify search API.
//!
//! # Overview
//! Validates and merges request parameters, picks a transport (JSON `POST`
//! or a callback-based `GET`) and decodes the answer. Requests are built as
//! plain data (host-does-IO pattern); an `Executor` or an FFI host performs
//! the actual round-trip.
//!
//! # Design
//! - `FindifyClient` is stateless: config, resolved settings, environment.
//! - The environment (`Server` / `Browser`) is injected, so transport
//!   selection is deterministic and testable on any host.
//! - Every call issues exactly one request: no retries, no batching.
//! - `UreqExecutor` (feature `ureq`) is the bundled blocking executor.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod http;
pub mod query;
pub mod request;
pub mod types;
pub mod url;

pub use client::FindifyClient;
pub use config::{make_settings, Config, Environment, Settings, TransportMethod};
pub use dispatch::{build_request, parse_response, Dispatch};
pub use error::{ApiError, ParamOrigin};
pub use executor::Executor;
#[cfg(feature = "ureq")]
pub use executor::UreqExecutor;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::count_bytes_in_string;
pub use request::{extend_request, ExtendedRequest};
pub use types::{
    ApiRequest, AutocompleteRequest, CollectionRequest, Filter, SearchRequest, Sort, SortOrder, User,
    UserParams,
};
pub use url::resolve_url;
