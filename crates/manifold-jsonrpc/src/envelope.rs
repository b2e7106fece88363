// crates/manifold-jsonrpc/src/envelope.rs
//
// JSON-RPC 2.0 envelope types and the error-code table.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use manifold_core::FaultKind;

/// Standard JSON-RPC 2.0 error codes.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// An incoming request envelope. `id` distinguishes absent (notification)
/// from an explicit `null` by wrapping in `Option` at the field level.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcEnvelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default, deserialize_with = "present_value")]
    pub id: Option<Value>,
}

impl JsonRpcEnvelope {
    /// A notification carries no `id` member at all and gets no reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Deserialize a field that was present, even as `null`, into `Some`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error member of a reply envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

/// An outgoing reply envelope: exactly one of `result` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcReply {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: Value,
}

impl JsonRpcReply {
    pub fn success(id: Value, result: Value) -> Self {
        JsonRpcReply {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        JsonRpcReply {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// Map a protocol-neutral fault kind onto its JSON-RPC error code.
pub fn error_code(kind: FaultKind) -> i64 {
    match kind {
        FaultKind::UnknownOperation => METHOD_NOT_FOUND,
        FaultKind::InvalidParams => INVALID_PARAMS,
        FaultKind::HandlerFailure => INTERNAL_ERROR,
    }
}
