//! Drive the C ABI the way a C host would: build through `outbound_build_*`,
//! execute the described request with ureq against the mock server, then
//! hand the response to `outbound_parse_response`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::time::Duration;

use outbound_ffi::types::{FfiDataTag, FfiErrorCode, FfiHttpRequest, FfiHttpResponse, FfiOutboundResult};
use outbound_ffi::*;

const KEY: &str = "APIKEY";

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, KEY).await
        })
        .unwrap();
    });

    addr
}

fn read(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

/// Execute the request carried by a build result, returning status and body.
fn execute(result: *mut FfiOutboundResult) -> (u16, String) {
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok, "build failed");
    assert_eq!(r.data_tag, FfiDataTag::Request);
    let req = unsafe { &*(r.data as *const FfiHttpRequest) };

    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_connect(Some(Duration::from_millis(req.connect_timeout_ms)))
        .timeout_global(Some(Duration::from_millis(req.timeout_ms)))
        .build()
        .new_agent();

    let mut builder = agent.post(read(req.url));
    let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
    for h in headers {
        builder = builder.header(read(h.key), read(h.value));
    }
    let mut response = builder.send(read(req.body).as_bytes()).expect("HTTP transport error");
    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

fn parse(client: *const types::FfiOutboundClient, status: u16, body: &str) -> (FfiErrorCode, i64) {
    let body = CString::new(body).unwrap();
    let response = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = outbound_parse_response(client, &response);
    let r = unsafe { &*result };
    let outcome = (r.error_code, r.api_code);
    outbound_free_result(result);
    outcome
}

#[test]
fn track_and_register_round_trip() {
    let addr = start_server();
    let key = CString::new(KEY).unwrap();
    let url = CString::new(format!("http://{addr}/v2")).unwrap();
    let client = outbound_client_new(key.as_ptr(), url.as_ptr());

    // Track.
    let (user_id, event, props) = (
        CString::new("42").unwrap(),
        CString::new(r#""signup""#).unwrap(),
        CString::new(r#"{"plan":"pro"}"#).unwrap(),
    );
    let built = outbound_build_track(client, user_id.as_ptr(), event.as_ptr(), props.as_ptr(), 0);
    let (status, body) = execute(built);
    outbound_free_result(built);
    assert_eq!(status, 200);
    assert_eq!(parse(client, status, &body), (FfiErrorCode::Ok, 0));

    // Register an APNs token.
    let (platform, user_id, token) = (
        CString::new("apns").unwrap(),
        CString::new(r#""u1""#).unwrap(),
        CString::new(r#""tok123""#).unwrap(),
    );
    let built = outbound_build_register_token(client, platform.as_ptr(), user_id.as_ptr(), token.as_ptr());
    let (status, body) = execute(built);
    outbound_free_result(built);
    assert_eq!(parse(client, status, &body), (FfiErrorCode::Ok, 0));

    outbound_client_free(client);
}

#[test]
fn wrong_key_round_trip_yields_api_error() {
    let addr = start_server();
    let key = CString::new("WRONG").unwrap();
    let url = CString::new(format!("http://{addr}/v2")).unwrap();
    let client = outbound_client_new(key.as_ptr(), url.as_ptr());

    let user_id = CString::new(r#""u1""#).unwrap();
    let built = outbound_build_identify(client, user_id.as_ptr(), std::ptr::null());
    let (status, body) = execute(built);
    outbound_free_result(built);

    assert_eq!(status, 401);
    assert_eq!(parse(client, status, &body), (FfiErrorCode::Api, 401));

    outbound_client_free(client);
}
