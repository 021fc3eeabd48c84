//! Response envelope decoding.
//!
//! The daemon may answer either with a bare JSON payload or with an object of
//! the form `{"status": ..., "result": ...}`. The presence of the `status` key
//! is the only thing that decides which shape a body has.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status carried by an enveloped response.
///
/// Older services answer with a numeric code, the daemon in this workspace
/// answers with `"ok"` / `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvelopeStatus {
    Code(i64),
    Text(String),
}

impl EnvelopeStatus {
    /// Convert an arbitrary JSON `status` value.
    ///
    /// Values that are neither integers nor strings are kept as their JSON text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(code) => EnvelopeStatus::Code(code),
                None => EnvelopeStatus::Text(n.to_string()),
            },
            Value::String(s) => EnvelopeStatus::Text(s),
            other => EnvelopeStatus::Text(other.to_string()),
        }
    }
}

impl fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeStatus::Code(code) => write!(f, "{code}"),
            EnvelopeStatus::Text(text) => f.write_str(text),
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The body had no `status` key; all of it is the payload.
    Bare(Value),
    /// The body carried a `status` key; `result` is the payload.
    Enveloped { status: EnvelopeStatus, result: Value },
}

impl Response {
    /// Decide the shape of a parsed body.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(mut map) if map.contains_key("status") => {
                let status = map.remove("status").unwrap_or(Value::Null);
                let result = map.remove("result").unwrap_or(Value::Null);
                Response::Enveloped {
                    status: EnvelopeStatus::from_value(status),
                    result,
                }
            }
            other => Response::Bare(other),
        }
    }

    pub fn status(&self) -> Option<&EnvelopeStatus> {
        match self {
            Response::Bare(_) => None,
            Response::Enveloped { status, .. } => Some(status),
        }
    }

    /// Split into the payload handed to callers and the status they should record.
    pub fn into_delivery(self) -> Delivery {
        match self {
            Response::Bare(payload) => Delivery {
                payload,
                status: None,
            },
            Response::Enveloped { status, result } => Delivery {
                payload: result,
                status: Some(status),
            },
        }
    }
}

/// What a successful request hands to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub payload: Value,
    pub status: Option<EnvelopeStatus>,
}

/// Build the success envelope the daemon sends.
pub fn ok_envelope(result: Value) -> Value {
    let mut map = Map::new();
    map.insert("status".to_string(), Value::String("ok".to_string()));
    map.insert("result".to_string(), result);
    Value::Object(map)
}

/// Build the error envelope the daemon sends.
pub fn error_envelope(error: &str, message: &str) -> Value {
    let mut map = Map::new();
    map.insert("status".to_string(), Value::String("error".to_string()));
    map.insert("error".to_string(), Value::String(error.to_string()));
    map.insert("message".to_string(), Value::String(message.to_string()));
    Value::Object(map)
}
