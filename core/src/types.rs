//! Domain types for the Outbound API.
//!
//! # Design
//! Callers hand the client loosely typed `serde_json::Value`s; the types
//! here are what survives validation. Payload structs serialize straight to
//! the wire bodies documented for each endpoint.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::OutboundError;

/// Name of a JSON value's runtime type as it appears in `Data` error
/// messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated user identifier: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserId {
    Text(String),
    Number(Number),
}

impl TryFrom<Value> for UserId {
    type Error = OutboundError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(UserId::Text(s)),
            Value::Number(n) => Ok(UserId::Number(n)),
            other => Err(OutboundError::data(format!(
                "User ID must be string or integer. Received {}.",
                value_type_name(&other)
            ))),
        }
    }
}

impl From<UserId> for Value {
    fn from(id: UserId) -> Value {
        match id {
            UserId::Text(s) => Value::String(s),
            UserId::Number(n) => Value::Number(n),
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Text(s) => f.write_str(s),
            UserId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Push notification platform a device token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Apns,
    Gcm,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Apns => "apns",
            Platform::Gcm => "gcm",
        }
    }

    pub fn register_call(&self) -> CallKind {
        match self {
            Platform::Apns => CallKind::RegisterApns,
            Platform::Gcm => CallKind::RegisterGcm,
        }
    }

    pub fn disable_call(&self) -> CallKind {
        match self {
            Platform::Apns => CallKind::DisableApns,
            Platform::Gcm => CallKind::DisableGcm,
        }
    }
}

impl AsRef<str> for Platform {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Platform {
    type Err = OutboundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apns" => Ok(Platform::Apns),
            "gcm" => Ok(Platform::Gcm),
            other => Err(OutboundError::data(format!("Invalid platform ({other})."))),
        }
    }
}

/// One of the six remote operations. The discriminants are the numeric
/// call codes exposed through the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CallKind {
    Track = 1,
    Identify = 2,
    RegisterApns = 3,
    RegisterGcm = 4,
    DisableApns = 5,
    DisableGcm = 6,
}

impl CallKind {
    /// Path appended to the API root for this call.
    pub fn path(&self) -> &'static str {
        match self {
            CallKind::Track => "/track",
            CallKind::Identify => "/identify",
            CallKind::RegisterApns => "/apns/register",
            CallKind::RegisterGcm => "/gcm/register",
            CallKind::DisableApns => "/apns/disable",
            CallKind::DisableGcm => "/gcm/disable",
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for CallKind {
    type Error = OutboundError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(CallKind::Track),
            2 => Ok(CallKind::Identify),
            3 => Ok(CallKind::RegisterApns),
            4 => Ok(CallKind::RegisterGcm),
            5 => Ok(CallKind::DisableApns),
            6 => Ok(CallKind::DisableGcm),
            other => Err(OutboundError::Internal(format!(
                "Unsupported API call ({other}) given."
            ))),
        }
    }
}

/// Body of an `/identify` call: the whitelisted, non-empty user fields plus
/// `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserPayload(pub(crate) Map<String, Value>);

impl UserPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Body of a `/track` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub event: String,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    pub timestamp: i64,
}

/// Body of a token register or disable call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPayload {
    pub token: String,
    pub user_id: UserId,
}
