//! C-ABI wrapper around `findify-core`.
//!
//! # Overview
//! Exposes the sans-IO half of the client through `extern "C"` functions:
//! the host builds a request, performs the HTTP call itself (a browser host
//! can serve the callback transport this way), and passes the response back
//! for decoding.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Configs and requests cross the boundary as JSON strings, matching the
//!   serde shape of the core types.
//! - A single `FfiFindifyResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `findify_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use findify_core::{ApiRequest, AutocompleteRequest, CollectionRequest, Config, Environment, SearchRequest};
use serde::de::DeserializeOwned;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

fn environment_from(tag: i32) -> Environment {
    if tag == 1 {
        Environment::Browser
    } else {
        Environment::Server
    }
}

/// Check a JSON config without creating a client.
///
/// Returns a result with `data_tag = None` on success; on failure the error
/// names the missing or malformed parameter.
#[unsafe(no_mangle)]
pub extern "C" fn findify_validate_config(config_json: *const c_char) -> *mut FfiFindifyResult {
    catch_unwind(|| {
        if config_json.is_null() {
            return FfiFindifyResult::null_arg("config_json");
        }
        let raw = unsafe { CStr::from_ptr(config_json) }.to_string_lossy();
        let config: Config = match serde_json::from_str(&raw) {
            Ok(c) => c,
            Err(e) => return FfiFindifyResult::invalid_json(e),
        };
        match config.validate() {
            Ok(()) => FfiFindifyResult::ok_empty(),
            Err(e) => FfiFindifyResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiFindifyResult::panic("panic in findify_validate_config"))
}

/// Create a client from a JSON config.
///
/// `environment` is 0 for a server host and 1 for a browser host.
/// Returns null if `config_json` is null, not valid JSON, or lacks a key;
/// use `findify_validate_config` to learn why.
/// The caller must free the returned pointer with `findify_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn findify_client_new(config_json: *const c_char, environment: i32) -> *mut FfiFindifyClient {
    catch_unwind(|| {
        if config_json.is_null() {
            return std::ptr::null_mut();
        }
        let raw = unsafe { CStr::from_ptr(config_json) }.to_string_lossy();
        let Ok(config) = serde_json::from_str::<Config>(&raw) else {
            return std::ptr::null_mut();
        };
        match findify_core::FindifyClient::with_environment(config, environment_from(environment)) {
            Ok(client) => Box::into_raw(Box::new(FfiFindifyClient { inner: client })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `findify_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn findify_client_free(client: *mut FfiFindifyClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

fn build_with<R: ApiRequest + DeserializeOwned>(
    client: *const FfiFindifyClient,
    request_json: *const c_char,
) -> *mut FfiFindifyResult {
    if client.is_null() {
        return FfiFindifyResult::null_arg("client");
    }
    if request_json.is_null() {
        return FfiFindifyResult::null_arg("request_json");
    }
    let client = unsafe { &*client };
    let raw = unsafe { CStr::from_ptr(request_json) }.to_string_lossy();
    let request: R = match serde_json::from_str(&raw) {
        Ok(r) => r,
        Err(e) => return FfiFindifyResult::invalid_json(e),
    };
    match client.inner.build(&request) {
        Ok(dispatch) => FfiFindifyResult::ok_request(dispatch),
        Err(e) => FfiFindifyResult::from_error(e),
    }
}

/// Build an autocomplete request from JSON such as `{"q":"shoe"}`.
///
/// Returns a result with `data_tag = Request` on success.
#[unsafe(no_mangle)]
pub extern "C" fn findify_build_autocomplete(
    client: *const FfiFindifyClient,
    request_json: *const c_char,
) -> *mut FfiFindifyResult {
    catch_unwind(|| build_with::<AutocompleteRequest>(client, request_json))
        .unwrap_or_else(|_| FfiFindifyResult::panic("panic in findify_build_autocomplete"))
}

/// Build a search request from JSON such as `{"q":"shoe","limit":24}`.
#[unsafe(no_mangle)]
pub extern "C" fn findify_build_search(
    client: *const FfiFindifyClient,
    request_json: *const c_char,
) -> *mut FfiFindifyResult {
    catch_unwind(|| build_with::<SearchRequest>(client, request_json))
        .unwrap_or_else(|_| FfiFindifyResult::panic("panic in findify_build_search"))
}

/// Build a smart-collection request from JSON such as `{"slot":"summer"}`.
#[unsafe(no_mangle)]
pub extern "C" fn findify_build_collection(
    client: *const FfiFindifyClient,
    request_json: *const c_char,
) -> *mut FfiFindifyResult {
    catch_unwind(|| build_with::<CollectionRequest>(client, request_json))
        .unwrap_or_else(|_| FfiFindifyResult::panic("panic in findify_build_collection"))
}

// ---------------------------------------------------------------------------
// Parse response function
// ---------------------------------------------------------------------------

/// Decode the response to a request built by a `findify_build_*` function.
///
/// Returns a result with `data_tag = Json` on success; `data` is the decoded
/// body as a JSON string.
#[unsafe(no_mangle)]
pub extern "C" fn findify_parse_response(
    client: *const FfiFindifyClient,
    request: *const FfiHttpRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiFindifyResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiFindifyResult::null_arg("client");
        }
        if request.is_null() {
            return FfiFindifyResult::null_arg("request");
        }
        if response.is_null() {
            return FfiFindifyResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let dispatch = unsafe { (*request).to_core() };
        let response = unsafe { &*response }.to_core();
        match client.inner.parse_response(&dispatch, response) {
            Ok(value) => FfiFindifyResult::ok_json(&value),
            Err(e) => FfiFindifyResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiFindifyResult::panic("panic in findify_parse_response"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFindifyResult` and whatever its `data` points to.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn findify_free_result(result: *mut FfiFindifyResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        unsafe { free_c_string(result.error_message) };
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Request => unsafe { FfiHttpRequest::free(result.data as *mut FfiHttpRequest) },
                FfiDataTag::Json => unsafe { free_c_string(result.data as *mut c_char) },
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn findify_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| unsafe { free_c_string(s) });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
