//! Validation and shaping of request payloads.
//!
//! Builders take the caller's loosely typed values, reject the ones of the
//! wrong type with a `Data` error, and produce the typed payload that goes
//! on the wire. They hold no state: identical input always yields identical
//! output.

use serde_json::{Map, Value};

use crate::error::OutboundError;
use crate::types::{value_type_name, EventPayload, Platform, TokenPayload, UserId, UserPayload};

/// User fields `/identify` accepts. Anything else is dropped.
pub const USER_FIELDS: [&str; 10] = [
    "first_name",
    "last_name",
    "email",
    "phone_number",
    "apns",
    "gcm",
    "group_id",
    "group_attributes",
    "previous_id",
    "attributes",
];

/// Loose emptiness test applied to user fields.
///
/// `null`, `false`, numeric zero, `""`, `"0"`, `[]` and `{}` are empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

pub fn validate_user_id(user_id: Value) -> Result<UserId, OutboundError> {
    UserId::try_from(user_id)
}

/// Build the `/identify` body from a user id and optional user info.
pub fn build_user(
    user_id: Value,
    user_info: Option<&Map<String, Value>>,
) -> Result<UserPayload, OutboundError> {
    let user_id = validate_user_id(user_id)?;

    let mut fields: Map<String, Value> = user_info
        .into_iter()
        .flatten()
        .filter(|(key, value)| USER_FIELDS.contains(&key.as_str()) && !is_empty_value(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    fields.insert("user_id".to_string(), user_id.into());

    Ok(UserPayload(fields))
}

/// Build the `/track` body.
///
/// A `timestamp` of `None` or `Some(0)` is replaced with the current time.
pub fn build_event(
    user_id: Value,
    event: Value,
    properties: Option<&Map<String, Value>>,
    timestamp: Option<i64>,
) -> Result<EventPayload, OutboundError> {
    let user_id = validate_user_id(user_id)?;
    let event = require_string(event, "Event")?;

    Ok(EventPayload {
        event,
        user_id,
        properties: properties.filter(|p| !p.is_empty()).cloned(),
        timestamp: resolve_timestamp(timestamp),
    })
}

/// Build a token register/disable body and resolve its platform.
pub fn build_token(
    platform: &str,
    user_id: Value,
    token: Value,
) -> Result<(Platform, TokenPayload), OutboundError> {
    let user_id = validate_user_id(user_id)?;
    let platform: Platform = platform.parse()?;
    let token = require_string(token, "Token")?;

    Ok((platform, TokenPayload { token, user_id }))
}

fn require_string(value: Value, what: &str) -> Result<String, OutboundError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(OutboundError::data(format!(
            "{what} must be a string. Received {}.",
            value_type_name(&other)
        ))),
    }
}

fn resolve_timestamp(timestamp: Option<i64>) -> i64 {
    match timestamp {
        Some(ts) if ts != 0 => ts,
        _ => chrono::Utc::now().timestamp(),
    }
}
