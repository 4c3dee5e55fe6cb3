//! Blocking execution of `HttpRequest`s.
//!
//! # Design
//! `Transport` is the seam between request building and the network. The
//! `Outbound` facade is generic over it so tests can observe requests
//! without a socket. `UreqTransport` opens a fresh agent per call, applies
//! both timeouts from the request, and returns 4xx/5xx responses as data so
//! the client alone decides what a body means.

use ureq::Agent;

use crate::error::OutboundError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP request and returns the response as plain data.
///
/// Failures to obtain a response must be reported as
/// `OutboundError::Connection`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, OutboundError>;
}

/// Default transport backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, OutboundError> {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(request.connect_timeout))
            .timeout_global(Some(request.timeout))
            .build()
            .new_agent();

        let mut builder = match request.method {
            HttpMethod::Post => agent.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send(request.body.as_bytes()).map_err(connection_error)?;
        let status = response.status().as_u16();
        let bytes = response.body_mut().read_to_vec().map_err(connection_error)?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse { status, body })
    }
}

fn connection_error(err: ureq::Error) -> OutboundError {
    let code = match &err {
        ureq::Error::Timeout(_) => "timeout".to_string(),
        ureq::Error::HostNotFound => "host_not_found".to_string(),
        ureq::Error::ConnectionFailed => "connection_failed".to_string(),
        ureq::Error::Io(io) => format!("io_{:?}", io.kind()).to_lowercase(),
        _ => "transport".to_string(),
    };
    OutboundError::Connection {
        code,
        message: err.to_string(),
    }
}
