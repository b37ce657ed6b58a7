//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::time::Duration;

use findify_core::{ApiError, Dispatch, HttpMethod, HttpRequest, HttpResponse, TransportMethod};

/// Opaque handle to a `FindifyClient`.
pub struct FfiFindifyClient {
    pub(crate) inner: findify_core::FindifyClient,
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

/// Which transport produced a request; the host needs it to decide whether
/// the response is JSON or a callback script.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FfiTransport {
    Post = 0,
    Jsonp = 1,
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A planned request. The host executes it and hands the response, together
/// with this request, to `findify_parse_response`.
///
/// `timeout_ms` is 0 when the request has no timeout. `body` is null for
/// `GET`; `callback` is null for `POST`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub transport: FfiTransport,
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u64,
    pub callback: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `Dispatch` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(dispatch: Dispatch) -> *mut Self {
        let Dispatch {
            transport,
            request,
            callback,
        } = dispatch;

        let headers_len = u32::try_from(request.headers.len()).unwrap_or(u32::MAX);
        let headers = if request.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = request
                .headers
                .into_iter()
                .take(headers_len as usize)
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        let ffi_req = Box::new(FfiHttpRequest {
            transport: match transport {
                TransportMethod::Post => FfiTransport::Post,
                TransportMethod::Jsonp => FfiTransport::Jsonp,
            },
            method: match request.method {
                HttpMethod::Get => FfiHttpMethod::Get,
                HttpMethod::Post => FfiHttpMethod::Post,
            },
            url: to_c_string(request.url),
            headers,
            headers_len,
            body: request.body.map_or(std::ptr::null_mut(), to_c_string),
            timeout_ms: request
                .timeout
                .map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            callback: callback.map_or(std::ptr::null_mut(), to_c_string),
        });
        Box::into_raw(ffi_req)
    }

    /// Rebuild the core `Dispatch` this request was created from.
    ///
    /// # Safety
    /// Every non-null pointer must be a valid NUL-terminated string (or
    /// header array of `headers_len` entries) as produced by `from_core`.
    pub(crate) unsafe fn to_core(&self) -> Dispatch {
        let headers = if self.headers.is_null() || self.headers_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.headers, self.headers_len as usize) }
                .iter()
                .map(|h| unsafe { (read_c_string(h.key), read_c_string(h.value)) })
                .collect()
        };
        let body = (!self.body.is_null()).then(|| unsafe { read_c_string(self.body) });
        let callback = (!self.callback.is_null()).then(|| unsafe { read_c_string(self.callback) });

        Dispatch {
            transport: match self.transport {
                FfiTransport::Post => TransportMethod::Post,
                FfiTransport::Jsonp => TransportMethod::Jsonp,
            },
            request: HttpRequest {
                method: match self.method {
                    FfiHttpMethod::Get => HttpMethod::Get,
                    FfiHttpMethod::Post => HttpMethod::Post,
                },
                url: unsafe { read_c_string(self.url) },
                headers,
                body,
                timeout: (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms)),
            },
            callback,
        }
    }

    /// Release a request created by `from_core`.
    ///
    /// # Safety
    /// `req` must come from `from_core` and not have been freed already.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            free_c_string(req.body);
            free_c_string(req.callback);
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                unsafe {
                    free_c_string(h.key);
                    free_c_string(h.value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request; the
/// FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> HttpResponse {
        let body = if self.body.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(self.body) }
                .to_string_lossy()
                .into_owned()
        };
        HttpResponse {
            status: self.status,
            headers: Vec::new(),
            body,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiFindifyResult`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MissingParam = 1,
    MissingUser = 2,
    MethodNotAllowed = 3,
    Config = 4,
    Http = 5,
    Timeout = 6,
    Transport = 7,
    Deserialization = 8,
    Serialization = 9,
    InvalidJson = 10,
    Panic = 11,
    NullArg = 12,
}

/// Tag that tells `findify_free_result` what `FfiFindifyResult::data` points to.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest*`.
    Request = 1,
    /// `data` is a NUL-terminated JSON string.
    Json = 2,
}

/// Result envelope for build and parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload named by `data_tag`. On failure `data` is null and
/// `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiFindifyResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiFindifyResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: Option<String>,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut std::ffi::c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiFindifyResult {
            error_code,
            error_message: error_message.map_or(std::ptr::null_mut(), to_c_string),
            http_status,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, 0, FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn ok_request(dispatch: Dispatch) -> *mut Self {
        let data = FfiHttpRequest::from_core(dispatch) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, None, 0, FfiDataTag::Request, data)
    }

    pub(crate) fn ok_json(value: &serde_json::Value) -> *mut Self {
        let data = to_c_string(value.to_string()) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, None, 0, FfiDataTag::Json, data)
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (code, status) = match &err {
            ApiError::MissingParam { .. } => (FfiErrorCode::MissingParam, 0),
            ApiError::MissingUser => (FfiErrorCode::MissingUser, 0),
            ApiError::MethodNotAllowed { .. } => (FfiErrorCode::MethodNotAllowed, 0),
            ApiError::Config(_) => (FfiErrorCode::Config, 0),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::Timeout { .. } => (FfiErrorCode::Timeout, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::boxed(code, Some(err.to_string()), status, FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn invalid_json(err: serde_json::Error) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidJson,
            Some(format!("invalid json argument: {err}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0, FfiDataTag::None, std::ptr::null_mut())
    }
}

// ---------------------------------------------------------------------------
// C string helpers
// ---------------------------------------------------------------------------

/// Hand a Rust string to C. Interior NULs are dropped rather than failing.
pub(crate) fn to_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

/// # Safety
/// `ptr` must be a valid NUL-terminated string.
pub(crate) unsafe fn read_c_string(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// # Safety
/// `ptr` must be null or come from `to_c_string` and not be freed already.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}
