//! Blocking facade: configure once, then one round-trip per call.
//!
//! `Outbound` owns its configuration behind an `RwLock` instead of a global,
//! so several differently configured instances can live side by side.
//! Every operation snapshots the configuration, builds the request, hands it
//! to the `Transport` and translates the response. Nothing is retried.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::OutboundClient;
use crate::config::Config;
use crate::error::OutboundError;
use crate::http::HttpRequest;
use crate::transport::{Transport, UreqTransport};

/// Blocking Outbound API client that owns its configuration and transport.
pub struct Outbound<T = UreqTransport> {
    config: RwLock<Option<Config>>,
    transport: T,
}

impl Outbound<UreqTransport> {
    /// An unconfigured facade over the default `ureq` transport.
    pub fn new() -> Self {
        Self::with_transport(UreqTransport)
    }

    /// A facade over the default transport, configured up front.
    pub fn from_config(config: Config) -> Self {
        let outbound = Self::new();
        outbound.configure(config);
        outbound
    }
}

impl Default for Outbound<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Outbound<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            config: RwLock::new(None),
            transport,
        }
    }

    /// Set the api key with the default 5 s connect and 30 s total timeouts.
    pub fn init(&self, api_key: impl Into<String>) {
        self.configure(Config::new(api_key));
    }

    pub fn init_with_timeouts(&self, api_key: impl Into<String>, connect_timeout: Duration, timeout: Duration) {
        self.configure(
            Config::new(api_key)
                .with_connect_timeout(connect_timeout)
                .with_timeout(timeout),
        );
    }

    /// Replace the whole configuration.
    pub fn configure(&self, config: Config) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    /// Forget the configuration so later calls fail with
    /// `OutboundError::Configuration`. Intended for tests.
    pub fn reset(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Identify a user, attaching whitelisted user fields.
    pub fn identify(
        &self,
        user_id: impl Into<Value>,
        user_info: Option<&Map<String, Value>>,
    ) -> Result<(), OutboundError> {
        let client = self.client()?;
        let request = client.build_identify(user_id, user_info)?;
        self.send(&client, request)
    }

    /// Track an event for a user. `timestamp` of `None` or `Some(0)` means now.
    pub fn track(
        &self,
        user_id: impl Into<Value>,
        event: impl Into<Value>,
        properties: Option<&Map<String, Value>>,
        timestamp: Option<i64>,
    ) -> Result<(), OutboundError> {
        let client = self.client()?;
        let request = client.build_track(user_id, event, properties, timestamp)?;
        self.send(&client, request)
    }

    /// Register a device token for push notifications on `apns` or `gcm`.
    pub fn register_token(
        &self,
        platform: impl AsRef<str>,
        user_id: impl Into<Value>,
        token: impl Into<Value>,
    ) -> Result<(), OutboundError> {
        let client = self.client()?;
        let request = client.build_register_token(platform, user_id, token)?;
        self.send(&client, request)
    }

    /// Disable a previously registered device token.
    pub fn disable_token(
        &self,
        platform: impl AsRef<str>,
        user_id: impl Into<Value>,
        token: impl Into<Value>,
    ) -> Result<(), OutboundError> {
        let client = self.client()?;
        let request = client.build_disable_token(platform, user_id, token)?;
        self.send(&client, request)
    }

    fn client(&self) -> Result<OutboundClient, OutboundError> {
        let guard = self.config.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(config) if config.has_api_key() => Ok(OutboundClient::new(config.clone())),
            _ => Err(OutboundError::Configuration),
        }
    }

    fn send(&self, client: &OutboundClient, request: HttpRequest) -> Result<(), OutboundError> {
        debug!(url = %request.url, "sending outbound request");
        let response = self.transport.execute(&request)?;
        client.parse_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a canned body.
    struct Recorder {
        requests: Mutex<Vec<HttpRequest>>,
        reply: String,
    }

    impl Recorder {
        fn replying(reply: &str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: reply.to_string(),
            }
        }

        fn count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Recorder {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, OutboundError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(HttpResponse {
                status: 200,
                body: self.reply.clone(),
            })
        }
    }

    struct Refused;

    impl Transport for Refused {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, OutboundError> {
            Err(OutboundError::Connection {
                code: "connection_failed".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    fn outbound(reply: &str) -> Outbound<Recorder> {
        let outbound = Outbound::with_transport(Recorder::replying(reply));
        outbound.init("APIKEY");
        outbound
    }

    fn body(req: &HttpRequest) -> Value {
        serde_json::from_str(&req.body).unwrap()
    }

    #[test]
    fn init_is_enforced() {
        let o = outbound("");
        o.reset();
        assert!(matches!(o.identify(1, None), Err(OutboundError::Configuration)));
        assert!(matches!(o.track(1, "e", None, None), Err(OutboundError::Configuration)));
        assert!(matches!(o.register_token("apns", 1, "t"), Err(OutboundError::Configuration)));
        assert!(matches!(o.disable_token("gcm", 1, "t"), Err(OutboundError::Configuration)));
        assert_eq!(o.transport().count(), 0);
    }

    #[test]
    fn never_initialized_fails_guard() {
        let o = Outbound::with_transport(Recorder::replying(""));
        assert!(matches!(o.identify(json!(["bad"]), None), Err(OutboundError::Configuration)));
        o.init("");
        assert!(matches!(o.identify(1, None), Err(OutboundError::Configuration)));
    }

    #[test]
    fn invalid_user_ids_never_reach_the_network() {
        let o = outbound("");
        for bad in [json!(["user_id"]), json!({"id": 1}), json!(true), Value::Null] {
            assert!(matches!(o.identify(bad.clone(), None), Err(OutboundError::Data(_))));
            assert!(matches!(o.track(bad.clone(), "event", None, None), Err(OutboundError::Data(_))));
            assert!(matches!(o.register_token("apns", bad.clone(), "t"), Err(OutboundError::Data(_))));
            assert!(matches!(o.disable_token("apns", bad, "t"), Err(OutboundError::Data(_))));
        }
        assert_eq!(o.transport().count(), 0);
    }

    #[test]
    fn invalid_event_platform_and_token_never_reach_the_network() {
        let o = outbound("");
        assert!(matches!(o.track("user_id", 9, None, None), Err(OutboundError::Data(_))));
        assert!(matches!(o.register_token("platform", "user_id", "token"), Err(OutboundError::Data(_))));
        assert!(matches!(o.disable_token("", "user_id", "token"), Err(OutboundError::Data(_))));
        assert!(matches!(o.register_token("apns", "user_id", 9), Err(OutboundError::Data(_))));
        assert!(matches!(o.disable_token("gcm", "user_id", json!(["t"])), Err(OutboundError::Data(_))));
        assert_eq!(o.transport().count(), 0);
    }

    #[test]
    fn track_succeeds_on_empty_body() {
        let o = outbound("");
        let props = json!({"plan": "pro"});
        o.track(42, "signup", props.as_object(), None).unwrap();

        let req = o.transport().last();
        assert!(req.url.ends_with("/track"));
        assert_eq!(req.header("X-Outbound-Key"), Some("APIKEY"));
        let sent = body(&req);
        assert_eq!(sent["event"], "signup");
        assert_eq!(sent["user_id"], 42);
        assert_eq!(sent["properties"], json!({"plan": "pro"}));
        assert!(sent["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn track_surfaces_api_error() {
        let o = outbound(r#"{"error":{"Message":"bad key","Code":401}}"#);
        let err = o.track(42, "signup", None, None).unwrap_err();
        assert!(matches!(err, OutboundError::Api { ref message, code: 401 } if message == "bad key"));
    }

    #[test]
    fn register_token_posts_token_body() {
        let o = outbound("");
        o.register_token("apns", "u1", "tok123").unwrap();
        let req = o.transport().last();
        assert_eq!(req.url, "https://api.outbound.io/v2/apns/register");
        assert_eq!(body(&req), json!({"token": "tok123", "user_id": "u1"}));
    }

    #[test]
    fn connection_errors_propagate_unchanged() {
        let o = Outbound::with_transport(Refused);
        o.init("APIKEY");
        let err = o.identify("u1", None).unwrap_err();
        assert!(matches!(err, OutboundError::Connection { ref code, .. } if code == "connection_failed"));
    }

    #[test]
    fn init_with_timeouts_reaches_requests() {
        let o = Outbound::with_transport(Recorder::replying(""));
        o.init_with_timeouts("APIKEY", Duration::from_secs(1), Duration::from_secs(2));
        o.identify("u1", None).unwrap();
        let req = o.transport().last();
        assert_eq!(req.connect_timeout, Duration::from_secs(1));
        assert_eq!(req.timeout, Duration::from_secs(2));
    }

    #[test]
    fn instances_keep_separate_configuration() {
        let a = outbound("");
        let b = Outbound::with_transport(Recorder::replying(""));
        b.init("OTHER");
        a.identify("u1", None).unwrap();
        b.identify("u1", None).unwrap();
        assert_eq!(a.transport().last().header("X-Outbound-Key"), Some("APIKEY"));
        assert_eq!(b.transport().last().header("X-Outbound-Key"), Some("OTHER"));
    }
}
