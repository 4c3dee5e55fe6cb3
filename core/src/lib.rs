//! Synchronous client for the Outbound event-tracking and push API.
//!
//! # Overview
//! Four operations (identify, track, register token, disable token) each
//! validate their arguments, shape a JSON payload, POST it to a fixed
//! endpoint and turn the response into `Ok(())` or an `OutboundError`.
//!
//! # Design
//! - `OutboundClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO), which keeps it
//!   deterministic and lets the FFI crate hand the I/O to a C host.
//! - `Outbound` is the blocking facade: it owns a `Config` and a
//!   `Transport` and performs one round-trip per call, no retries.
//! - Dynamic arguments are `serde_json::Value`s so the runtime type checks
//!   of the API stay meaningful for callers holding loosely typed data.
//!
//! ```no_run
//! use outbound_core::Outbound;
//! use serde_json::json;
//!
//! let outbound = Outbound::new();
//! outbound.init("APIKEY");
//! let props = json!({"plan": "pro"});
//! outbound.track(42, "signup", props.as_object(), None)?;
//! # Ok::<(), outbound_core::OutboundError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod outbound;
pub mod payload;
pub mod transport;
pub mod types;

pub use client::{OutboundClient, CLIENT_ID};
pub use config::Config;
pub use error::OutboundError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use outbound::Outbound;
pub use transport::{Transport, UreqTransport};
pub use types::{CallKind, EventPayload, Platform, TokenPayload, UserId, UserPayload};
