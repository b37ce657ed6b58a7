//! Public facade of the Findify client.
//!
//! # Design
//! `FindifyClient` holds the immutable config, the settings resolved from it,
//! and the environment, and nothing else. Each operation is split into a
//! `build_*` method that validates and plans the request and a shared
//! `parse_response`; the convenience methods run both around an `Executor`.

use serde_json::Value;
use tracing::debug;

use crate::config::{make_settings, Config, Environment, Settings};
use crate::dispatch::{self, Dispatch};
use crate::error::ApiError;
use crate::executor::Executor;
use crate::http::HttpResponse;
use crate::request::extend_request;
use crate::types::{ApiRequest, AutocompleteRequest, CollectionRequest, SearchRequest};

/// Stateless client for the Findify API.
#[derive(Debug, Clone)]
pub struct FindifyClient {
    config: Config,
    settings: Settings,
    environment: Environment,
}

impl FindifyClient {
    /// Build a client for the environment implied by the compile target.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        Self::with_environment(config, Environment::detect())
    }

    pub fn with_environment(config: Config, environment: Environment) -> Result<Self, ApiError> {
        config.validate()?;
        let settings = make_settings(&config, environment);
        Ok(Self {
            config,
            settings,
            environment,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn build_autocomplete(&self, request: &AutocompleteRequest) -> Result<Dispatch, ApiError> {
        self.build(request)
    }

    pub fn build_search(&self, request: &SearchRequest) -> Result<Dispatch, ApiError> {
        self.build(request)
    }

    pub fn build_collection(&self, request: &CollectionRequest) -> Result<Dispatch, ApiError> {
        self.build(request)
    }

    /// Validate, merge with config, and plan any operation's request.
    pub fn build<R: ApiRequest>(&self, request: &R) -> Result<Dispatch, ApiError> {
        request.validate()?;
        let payload = extend_request(request, &self.config)?;
        let path = request.path();
        debug!(%path, "building request");
        dispatch::build_request(&path, &payload, &self.settings, self.environment)
    }

    pub fn parse_response(&self, dispatch: &Dispatch, response: HttpResponse) -> Result<Value, ApiError> {
        dispatch::parse_response(dispatch, response)
    }

    pub fn autocomplete<E: Executor>(&self, request: &AutocompleteRequest, executor: &E) -> Result<Value, ApiError> {
        self.send(request, executor)
    }

    pub fn search<E: Executor>(&self, request: &SearchRequest, executor: &E) -> Result<Value, ApiError> {
        self.send(request, executor)
    }

    pub fn collection<E: Executor>(&self, request: &CollectionRequest, executor: &E) -> Result<Value, ApiError> {
        self.send(request, executor)
    }

    /// Build, execute once, and parse. No retries.
    pub fn send<R: ApiRequest, E: Executor>(&self, request: &R, executor: &E) -> Result<Value, ApiError> {
        let dispatch = self.build(request)?;
        let response = executor.execute(&dispatch.request)?;
        self.parse_response(&dispatch, response)
    }
}
