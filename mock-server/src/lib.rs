use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

/// Every endpoint the Outbound v2 API exposes.
pub const ROUTES: [&str; 6] = [
    "/v2/track",
    "/v2/identify",
    "/v2/apns/register",
    "/v2/gcm/register",
    "/v2/apns/disable",
    "/v2/gcm/disable",
];

/// One call as the server saw it. Bodies that are not JSON are kept as a
/// JSON string holding the raw text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub api_key: Option<String>,
    pub client: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

/// Router that accepts calls carrying `api_key` in `X-Outbound-Key`.
pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        calls: Arc::new(RwLock::new(Vec::new())),
    };
    ROUTES
        .iter()
        .fold(Router::new(), |router, path| router.route(path, post(handle_call)))
        .route("/_calls", get(list_calls))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

async fn list_calls(State(state): State<AppState>) -> Json<Vec<RecordedCall>> {
    Json(state.calls.read().await.clone())
}

async fn handle_call(State(state): State<AppState>, uri: Uri, headers: HeaderMap, body: String) -> Response {
    let api_key = header(&headers, "x-outbound-key");
    let parsed: Option<Value> = serde_json::from_str(&body).ok();
    info!(path = %uri.path(), "received call");

    state.calls.write().await.push(RecordedCall {
        path: uri.path().to_string(),
        api_key: api_key.clone(),
        client: header(&headers, "x-outbound-client"),
        content_type: header(&headers, "content-type"),
        body: parsed.clone().unwrap_or(Value::String(body)),
    });

    if api_key.as_deref() != Some(&*state.api_key) {
        return error_reply(StatusCode::UNAUTHORIZED, "bad key");
    }
    match parsed {
        Some(Value::Object(fields)) if fields.contains_key("user_id") => StatusCode::OK.into_response(),
        Some(Value::Object(_)) => error_reply(StatusCode::BAD_REQUEST, "user_id is required"),
        _ => error_reply(StatusCode::BAD_REQUEST, "invalid JSON body"),
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    let body = json!({"error": {"Message": message, "Code": status.as_u16()}});
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_call_serializes_to_json() {
        let call = RecordedCall {
            path: "/v2/track".to_string(),
            api_key: Some("KEY".to_string()),
            client: None,
            content_type: Some("application/json".to_string()),
            body: json!({"user_id": 1}),
        };
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["path"], "/v2/track");
        assert_eq!(value["api_key"], "KEY");
        assert!(value["client"].is_null());
        assert_eq!(value["body"]["user_id"], 1);
    }

    #[test]
    fn error_reply_uses_api_error_shape() {
        let resp = error_reply(StatusCode::UNAUTHORIZED, "bad key");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Outbound-Key", "KEY".parse().unwrap());
        assert_eq!(header(&headers, "x-outbound-key").as_deref(), Some("KEY"));
        assert!(header(&headers, "x-outbound-client").is_none());
    }
}
