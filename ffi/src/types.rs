//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use outbound_core::{HttpMethod, OutboundError};

/// Opaque handle to an `OutboundClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiOutboundClient {
    pub(crate) inner: outbound_core::OutboundClient,
}

/// Build a C string, replacing interior NULs so the conversion cannot fail.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    CString::new(s.replace('\0', " "))
        .unwrap_or_default()
        .into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Post = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Carried in an `FfiOutboundResult` returned by `outbound_build_*`. The C
/// caller executes the request, honouring both timeouts, and passes the
/// response back through `outbound_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: outbound_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: c_string(req.url),
            headers,
            headers_len,
            body: c_string(req.body),
            connect_timeout_ms: req.connect_timeout.as_millis() as u64,
            timeout_ms: req.timeout.as_millis() as u64,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request, then
/// passes a pointer to `outbound_parse_response`. The FFI layer reads but
/// does not free these fields. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiOutboundResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    Data = 2,
    Connection = 3,
    Api = 4,
    Protocol = 5,
    Internal = 6,
    Serialization = 7,
    Panic = 8,
    NullArg = 9,
}

/// Tag that tells `outbound_free_result` what `FfiOutboundResult::data`
/// points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Request = 1,
    Text = 2,
}

/// Result envelope for every build, routing and parse operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`.
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, `api_code` holds the server code for `Api`
/// errors, and `data` is null.
#[repr(C)]
pub struct FfiOutboundResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub api_code: i64,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiOutboundResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        api_code: i64,
        data_tag: FfiDataTag,
        data: *mut std::ffi::c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiOutboundResult {
            error_code,
            error_message,
            api_code,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a request to execute.
    pub(crate) fn ok_request(req: outbound_core::HttpRequest) -> *mut Self {
        let data = FfiHttpRequest::from_core(req) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::Request, data)
    }

    /// Build a success result carrying a C string (e.g. a URL).
    pub(crate) fn ok_text(text: String) -> *mut Self {
        let data = c_string(text) as *mut std::ffi::c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::Text, data)
    }

    /// Build a success result with no data payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result from an `OutboundError`.
    pub(crate) fn from_error(err: OutboundError) -> *mut Self {
        let (error_code, api_code) = match &err {
            OutboundError::Configuration => (FfiErrorCode::Configuration, 0),
            OutboundError::Data(_) => (FfiErrorCode::Data, 0),
            OutboundError::Connection { .. } => (FfiErrorCode::Connection, 0),
            OutboundError::Api { code, .. } => (FfiErrorCode::Api, *code),
            OutboundError::Protocol { .. } => (FfiErrorCode::Protocol, 0),
            OutboundError::Internal(_) => (FfiErrorCode::Internal, 0),
            OutboundError::Serialization(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::boxed(error_code, c_string(err.to_string()), api_code, FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            c_string(format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, c_string(msg), 0, FfiDataTag::None, std::ptr::null_mut())
    }
}
