// crates/manifold-core/src/message.rs
//
// Canonical in-memory representation of an RPC call and its outcome,
// independent of any wire encoding.

use std::fmt;

use serde_json::Value;

// ---------------------------------------------------------------------------
// CorrelationId
// ---------------------------------------------------------------------------

/// Opaque identifier linking a request to its response.
///
/// Adapters carry the wire-level id through unchanged so that batched or
/// out-of-order completions can be demultiplexed by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrelationId {
    /// No id on the wire (e.g. a SOAP request/response pair).
    None,
    /// Numeric id.
    Number(i64),
    /// String id.
    Text(String),
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationId::None => write!(f, "-"),
            CorrelationId::Number(n) => write!(f, "{}", n),
            CorrelationId::Text(s) => write!(f, "{}", s),
        }
    }
}

// ---------------------------------------------------------------------------
// TransportKind
// ---------------------------------------------------------------------------

/// Which transport a request entered through. Used for logging only; the
/// dispatcher treats all origins identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    JsonRpc,
    Soap,
    Grpc,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::JsonRpc => write!(f, "json-rpc"),
            TransportKind::Soap => write!(f, "soap"),
            TransportKind::Grpc => write!(f, "grpc"),
        }
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Arguments of a call, either positional or named.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// No arguments supplied.
    None,
    /// Positional arguments (JSON-RPC `params` array).
    Positional(Vec<Value>),
    /// Named arguments (JSON-RPC `params` object, SOAP child elements).
    Named(serde_json::Map<String, Value>),
}

impl Params {
    /// Collapse into a single JSON value for handlers that deserialize a
    /// typed request struct. `None` becomes JSON null.
    pub fn into_value(self) -> Value {
        match self {
            Params::None => Value::Null,
            Params::Positional(items) => Value::Array(items),
            Params::Named(map) => Value::Object(map),
        }
    }

    /// Build from an already-parsed JSON value. Arrays become positional
    /// arguments, objects named ones, null becomes `None`. Any other value
    /// is rejected; a scalar is not a valid argument structure.
    pub fn from_value(value: Value) -> Option<Params> {
        match value {
            Value::Null => Some(Params::None),
            Value::Array(items) => Some(Params::Positional(items)),
            Value::Object(map) => Some(Params::Named(map)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fault
// ---------------------------------------------------------------------------

/// Classification of a failed call, shared by all transports. Each adapter
/// re-encodes the kind into its native error channel (JSON-RPC error code,
/// SOAP fault code, gRPC status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The requested operation is not registered.
    UnknownOperation,
    /// The arguments did not match what the handler expects.
    InvalidParams,
    /// The handler raised a domain error or an unexpected fault.
    HandlerFailure,
}

/// Protocol-neutral error descriptor carried in a failed `RpcResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
}

impl Fault {
    pub fn unknown_operation(method: &str) -> Self {
        Fault {
            kind: FaultKind::UnknownOperation,
            message: format!("unknown operation: {}", method),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::InvalidParams,
            message: message.into(),
        }
    }

    pub fn handler_failure(message: impl Into<String>) -> Self {
        Fault {
            kind: FaultKind::HandlerFailure,
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// RpcRequest / RpcResponse
// ---------------------------------------------------------------------------

/// A decoded call. Created by a transport adapter, consumed once by the
/// dispatcher, never mutated after creation.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Name of the operation to invoke.
    pub method: String,
    /// Call arguments.
    pub params: Params,
    /// Wire-level id, echoed back verbatim in the response.
    pub correlation: CorrelationId,
    /// Transport the request entered through.
    pub origin: TransportKind,
}

/// The outcome of a dispatched call. Created by the dispatcher, consumed
/// once by the originating adapter.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    /// Correlation id of the request this answers.
    pub correlation: CorrelationId,
    /// Result payload on success, fault descriptor on failure.
    pub outcome: Result<Value, Fault>,
}
