//! Request builder and response parser for the Outbound API.
//!
//! # Design
//! `OutboundClient` holds one immutable `Config` and carries no state between
//! calls. Each operation is a `build_*` method that guards, validates and
//! shapes the payload into an `HttpRequest`; a single `parse_response` turns
//! whatever came back into `Ok(())` or a typed error. The caller executes the
//! HTTP round-trip in between, so this module never does I/O.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::OutboundError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::payload;
use crate::types::CallKind;

/// Value of the `X-Outbound-Client` header.
pub const CLIENT_ID: &str = concat!("Rust/", env!("CARGO_PKG_VERSION"));

/// Synchronous, stateless client for the Outbound API.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    config: Config,
}

impl OutboundClient {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full URL for a call kind.
    pub fn url(&self, call: CallKind) -> String {
        format!("{}{}", self.config.base_url(), call.path())
    }

    pub fn build_identify(
        &self,
        user_id: impl Into<Value>,
        user_info: Option<&Map<String, Value>>,
    ) -> Result<HttpRequest, OutboundError> {
        self.ensure_configured()?;
        let user = payload::build_user(user_id.into(), user_info)?;
        self.build_request(CallKind::Identify, &user)
    }

    pub fn build_track(
        &self,
        user_id: impl Into<Value>,
        event: impl Into<Value>,
        properties: Option<&Map<String, Value>>,
        timestamp: Option<i64>,
    ) -> Result<HttpRequest, OutboundError> {
        self.ensure_configured()?;
        let event = payload::build_event(user_id.into(), event.into(), properties, timestamp)?;
        self.build_request(CallKind::Track, &event)
    }

    pub fn build_register_token(
        &self,
        platform: impl AsRef<str>,
        user_id: impl Into<Value>,
        token: impl Into<Value>,
    ) -> Result<HttpRequest, OutboundError> {
        self.ensure_configured()?;
        let (platform, token) = payload::build_token(platform.as_ref(), user_id.into(), token.into())?;
        self.build_request(platform.register_call(), &token)
    }

    pub fn build_disable_token(
        &self,
        platform: impl AsRef<str>,
        user_id: impl Into<Value>,
        token: impl Into<Value>,
    ) -> Result<HttpRequest, OutboundError> {
        self.ensure_configured()?;
        let (platform, token) = payload::build_token(platform.as_ref(), user_id.into(), token.into())?;
        self.build_request(platform.disable_call(), &token)
    }

    /// Translate a response into the call outcome.
    ///
    /// An empty (or all-whitespace) body is success regardless of status.
    /// Anything else must be an `{"error": {"Message", "Code"}}` object.
    pub fn parse_response(&self, response: HttpResponse) -> Result<(), OutboundError> {
        let body = response.body.trim();
        if body.is_empty() {
            debug!(status = response.status, "outbound call succeeded");
            return Ok(());
        }
        Err(api_error(body))
    }

    fn ensure_configured(&self) -> Result<(), OutboundError> {
        if self.config.has_api_key() {
            Ok(())
        } else {
            Err(OutboundError::Configuration)
        }
    }

    fn build_request<P: Serialize>(&self, call: CallKind, payload: &P) -> Result<HttpRequest, OutboundError> {
        let body = serde_json::to_string(payload).map_err(|e| OutboundError::Serialization(e.to_string()))?;
        let url = self.url(call);
        debug!(?call, %url, "built outbound request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ("Content-type".to_string(), "application/json".to_string()),
                ("X-Outbound-Key".to_string(), self.config.api_key().to_string()),
                ("X-Outbound-Client".to_string(), CLIENT_ID.to_string()),
            ],
            body,
            connect_timeout: self.config.connect_timeout(),
            timeout: self.config.timeout(),
        })
    }
}

/// Map a non-empty response body to `Api`, or `Protocol` when it is not a
/// well-formed error object.
fn api_error(body: &str) -> OutboundError {
    let parsed: Option<(String, i64)> = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        let error = v.get("error")?;
        let message = error.get("Message")?.as_str()?.to_string();
        let code = error.get("Code")?.as_i64()?;
        Some((message, code))
    });
    match parsed {
        Some((message, code)) => OutboundError::Api { message, code },
        None => OutboundError::Protocol { body: body.to_string() },
    }
}
