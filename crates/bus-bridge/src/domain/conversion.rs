//! Conversion between routing-engine messages and bus messages
//!
//! RULES:
//! - No I/O operations
//! - Conversion errors surface before anything is sent

use serde_json::Value;
use shared_bus::{Body, DeliveryOptions, MultiMap};
use std::time::Duration;

use crate::domain::exchange::Headers;
use crate::domain::mapping::BodyType;
use crate::error::ConversionError;

/// Apply the mapping's body transformation
pub fn convert_body(body: &Body, body_type: BodyType) -> Result<Body, ConversionError> {
    match body_type {
        BodyType::Passthrough => Ok(body.clone()),
        BodyType::Text => to_text(body),
        BodyType::Bytes => to_bytes(body),
        BodyType::Json => to_json(body),
    }
}

fn to_text(body: &Body) -> Result<Body, ConversionError> {
    match body {
        Body::Null | Body::Text(_) => Ok(body.clone()),
        Body::Bytes(bytes) => std::str::from_utf8(bytes)
            .map(|text| Body::Text(text.to_string()))
            .map_err(|e| ConversionError::InvalidUtf8(e.to_string())),
        // A JSON string converts to its contents, not its quoted form.
        Body::Json(Value::String(text)) => Ok(Body::Text(text.clone())),
        Body::Json(value) => Ok(Body::Text(value.to_string())),
    }
}

fn to_bytes(body: &Body) -> Result<Body, ConversionError> {
    match body {
        Body::Null | Body::Bytes(_) => Ok(body.clone()),
        Body::Text(text) => Ok(Body::from(text.as_bytes().to_vec())),
        Body::Json(value) => serde_json::to_vec(value)
            .map(Body::from)
            .map_err(|e| ConversionError::InvalidJson(e.to_string())),
    }
}

fn to_json(body: &Body) -> Result<Body, ConversionError> {
    match body {
        Body::Null | Body::Json(_) => Ok(body.clone()),
        Body::Text(text) => serde_json::from_str(text)
            .map(Body::Json)
            .map_err(|e| ConversionError::InvalidJson(e.to_string())),
        Body::Bytes(bytes) => serde_json::from_slice(bytes)
            .map(Body::Json)
            .map_err(|e| ConversionError::InvalidJson(e.to_string())),
    }
}

/// Build delivery options for one outbound message
///
/// Headers are copied only when `headers_copy` is set. Null values are
/// skipped, strings are copied verbatim, arrays contribute one entry per
/// non-null element and anything else uses its compact JSON form.
pub fn delivery_options(headers: &Headers, headers_copy: bool, send_timeout: Duration) -> DeliveryOptions {
    let mut options = DeliveryOptions::new().with_send_timeout(send_timeout);
    if headers_copy {
        for (name, value) in headers {
            for rendered in header_strings(value) {
                options.add_header(name.as_str(), rendered);
            }
        }
    }
    options
}

fn header_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(header_string).collect(),
        other => header_string(other).into_iter().collect(),
    }
}

fn header_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Convert reply headers into routing-engine headers
///
/// A name with one value becomes a JSON string; a name with several values
/// becomes an array of strings.
pub fn reply_headers(headers: &MultiMap) -> Headers {
    headers
        .names()
        .into_iter()
        .map(|name| {
            let values = headers.get_all(name);
            let value = match values.as_slice() {
                [single] => Value::String((*single).to_string()),
                many => Value::Array(
                    many.iter()
                        .map(|v| Value::String((*v).to_string()))
                        .collect(),
                ),
            };
            (name.to_string(), value)
        })
        .collect()
}
