//! C-ABI wrapper around `outbound-core`.
//!
//! # Overview
//! Exposes the Outbound request builders and response parser through
//! `extern "C"` functions so any language with a C FFI can shape payloads
//! and interpret responses while doing the HTTP round-trip itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Loosely typed arguments (user ids, events, tokens, user info,
//!   properties) arrive as JSON text, so the core's type checks apply to C
//!   callers exactly as they do to Rust callers.
//! - Every operation returns an `FfiOutboundResult`: an error code plus
//!   message, or a payload tagged by `FfiDataTag`.
//! - The C caller owns all returned pointers and must call the matching
//!   `outbound_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use outbound_core::{CallKind, Config, HttpRequest, HttpResponse, OutboundClient, OutboundError};
use serde_json::{Map, Value};

use types::*;

/// Run `f`, turning a panic into an `FfiErrorCode::Panic` result.
fn guarded<F>(name: &str, f: F) -> *mut FfiOutboundResult
where
    F: FnOnce() -> *mut FfiOutboundResult + UnwindSafe,
{
    catch_unwind(f).unwrap_or_else(|_| FfiOutboundResult::panic(&format!("panic in {name}")))
}

fn request_result(result: Result<HttpRequest, OutboundError>) -> *mut FfiOutboundResult {
    match result {
        Ok(req) => FfiOutboundResult::ok_request(req),
        Err(e) => FfiOutboundResult::from_error(e),
    }
}

/// Read a non-null C string. `None` if it is not valid UTF-8.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Parse a non-null C string as a JSON value.
unsafe fn json_arg(ptr: *const c_char, name: &str) -> Result<Value, OutboundError> {
    let text = unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| OutboundError::Data(format!("{name} is not valid UTF-8.")))?;
    serde_json::from_str(text).map_err(|e| OutboundError::Data(format!("{name} is not valid JSON: {e}.")))
}

/// Parse an optional JSON object argument. Null pointers and JSON `null`
/// both mean "not supplied".
unsafe fn object_arg(ptr: *const c_char, name: &str) -> Result<Option<Map<String, Value>>, OutboundError> {
    if ptr.is_null() {
        return Ok(None);
    }
    match unsafe { json_arg(ptr, name) }? {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        _ => Err(OutboundError::Data(format!("{name} must be a JSON object."))),
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client with default timeouts.
///
/// `base_url` may be null to use the public API root. Returns null if
/// `api_key` is null, if either string is not valid UTF-8, or if an
/// internal panic occurs. An empty `api_key`
/// yields a client whose calls all fail with `Configuration`.
/// The caller must free the returned pointer with `outbound_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_client_new(api_key: *const c_char, base_url: *const c_char) -> *mut FfiOutboundClient {
    catch_unwind(|| {
        if api_key.is_null() {
            return std::ptr::null_mut();
        }
        let Some(key) = (unsafe { str_arg(api_key) }) else {
            return std::ptr::null_mut();
        };
        let mut config = Config::new(key);
        if !base_url.is_null() {
            let Some(url) = (unsafe { str_arg(base_url) }) else {
                return std::ptr::null_mut();
            };
            config = config.with_base_url(url);
        }
        Box::into_raw(Box::new(FfiOutboundClient {
            inner: OutboundClient::new(config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `outbound_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_client_free(client: *mut FfiOutboundClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build an identify request.
///
/// `user_id_json` is a JSON string or number, `user_info_json` an optional
/// JSON object (null to omit).
#[unsafe(no_mangle)]
pub extern "C" fn outbound_build_identify(
    client: *const FfiOutboundClient,
    user_id_json: *const c_char,
    user_info_json: *const c_char,
) -> *mut FfiOutboundResult {
    guarded("outbound_build_identify", || {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiOutboundResult::null_arg("client");
        };
        if user_id_json.is_null() {
            return FfiOutboundResult::null_arg("user_id");
        }
        let result = unsafe { json_arg(user_id_json, "user_id") }.and_then(|user_id| {
            let info = unsafe { object_arg(user_info_json, "user_info") }?;
            client.inner.build_identify(user_id, info.as_ref())
        });
        request_result(result)
    })
}

/// Build a track request.
///
/// `properties_json` may be null. A `timestamp` of 0 means "now".
#[unsafe(no_mangle)]
pub extern "C" fn outbound_build_track(
    client: *const FfiOutboundClient,
    user_id_json: *const c_char,
    event_json: *const c_char,
    properties_json: *const c_char,
    timestamp: i64,
) -> *mut FfiOutboundResult {
    guarded("outbound_build_track", || {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiOutboundResult::null_arg("client");
        };
        if user_id_json.is_null() {
            return FfiOutboundResult::null_arg("user_id");
        }
        if event_json.is_null() {
            return FfiOutboundResult::null_arg("event");
        }
        let result = unsafe { json_arg(user_id_json, "user_id") }.and_then(|user_id| {
            let event = unsafe { json_arg(event_json, "event") }?;
            let properties = unsafe { object_arg(properties_json, "properties") }?;
            client
                .inner
                .build_track(user_id, event, properties.as_ref(), Some(timestamp))
        });
        request_result(result)
    })
}

/// Build a device-token registration request for `platform` ("apns" or
/// "gcm").
#[unsafe(no_mangle)]
pub extern "C" fn outbound_build_register_token(
    client: *const FfiOutboundClient,
    platform: *const c_char,
    user_id_json: *const c_char,
    token_json: *const c_char,
) -> *mut FfiOutboundResult {
    guarded("outbound_build_register_token", || {
        build_token(client, platform, user_id_json, token_json, |c, p, u, t| {
            c.build_register_token(p, u, t)
        })
    })
}

/// Build a device-token disable request for `platform` ("apns" or "gcm").
#[unsafe(no_mangle)]
pub extern "C" fn outbound_build_disable_token(
    client: *const FfiOutboundClient,
    platform: *const c_char,
    user_id_json: *const c_char,
    token_json: *const c_char,
) -> *mut FfiOutboundResult {
    guarded("outbound_build_disable_token", || {
        build_token(client, platform, user_id_json, token_json, |c, p, u, t| {
            c.build_disable_token(p, u, t)
        })
    })
}

fn build_token(
    client: *const FfiOutboundClient,
    platform: *const c_char,
    user_id_json: *const c_char,
    token_json: *const c_char,
    build: impl FnOnce(&OutboundClient, &str, Value, Value) -> Result<HttpRequest, OutboundError>,
) -> *mut FfiOutboundResult {
    let Some(client) = (unsafe { client.as_ref() }) else {
        return FfiOutboundResult::null_arg("client");
    };
    for (ptr, name) in [(platform, "platform"), (user_id_json, "user_id"), (token_json, "token")] {
        if ptr.is_null() {
            return FfiOutboundResult::null_arg(name);
        }
    }
    let Some(platform) = (unsafe { str_arg(platform) }) else {
        return FfiOutboundResult::from_error(OutboundError::Data("platform is not valid UTF-8.".to_string()));
    };
    let result = unsafe { json_arg(user_id_json, "user_id") }.and_then(|user_id| {
        let token = unsafe { json_arg(token_json, "token") }?;
        build(&client.inner, platform, user_id, token)
    });
    request_result(result)
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Resolve the URL for a numeric call code (1 track, 2 identify,
/// 3/4 register apns/gcm, 5/6 disable apns/gcm).
///
/// Returns a `Text` result, or an `Internal` error for unknown codes.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_call_url(client: *const FfiOutboundClient, call_code: u8) -> *mut FfiOutboundResult {
    guarded("outbound_call_url", || {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiOutboundResult::null_arg("client");
        };
        match CallKind::try_from(call_code) {
            Ok(call) => FfiOutboundResult::ok_text(client.inner.url(call)),
            Err(e) => FfiOutboundResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Parse response
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_string_lossy().into_owned()
    };
    HttpResponse {
        status: resp.status,
        body,
    }
}

/// Interpret the response to any Outbound call.
///
/// Returns `data_tag = None` on success, otherwise an `Api` (with
/// `api_code`) or `Protocol` error.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_parse_response(
    client: *const FfiOutboundClient,
    response: *const FfiHttpResponse,
) -> *mut FfiOutboundResult {
    guarded("outbound_parse_response", || {
        let Some(client) = (unsafe { client.as_ref() }) else {
            return FfiOutboundResult::null_arg("client");
        };
        let Some(resp) = (unsafe { response.as_ref() }) else {
            return FfiOutboundResult::null_arg("response");
        };
        match client.inner.parse_response(ffi_response_to_core(resp)) {
            Ok(()) => FfiOutboundResult::ok_empty(),
            Err(e) => FfiOutboundResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` taken out of a result. Prefer
/// `outbound_free_result`, which frees the request it carries.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_string(req.url);
        free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize))
            };
            for h in headers.iter() {
                free_string(h.key);
                free_string(h.value);
            }
        }
    });
}

/// Free an `FfiOutboundResult` and whatever its `data` points to.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_free_result(result: *mut FfiOutboundResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_string(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Request => outbound_free_request(result.data as *mut FfiHttpRequest),
                FfiDataTag::Text => free_string(result.data as *mut c_char),
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn outbound_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_string(s));
}

fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
