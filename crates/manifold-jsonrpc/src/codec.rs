// crates/manifold-jsonrpc/src/codec.rs
//
// Frame-level adapter logic: decode a text frame into canonical requests,
// dispatch, and re-encode replies. Batches fan out concurrently but the
// reply array is positional, matching the request array order regardless
// of completion order.

use futures_util::future::join_all;
use serde_json::Value;

use manifold_core::{CorrelationId, Dispatcher, Params, RpcRequest, TransportKind};

use crate::envelope::{
    error_code, JsonRpcEnvelope, JsonRpcReply, INVALID_REQUEST, PARSE_ERROR,
};

/// Handle one complete incoming text frame. Returns the reply frame to
/// write back, or `None` when no reply is due (notification, or a batch of
/// nothing but notifications).
pub async fn handle_frame(dispatcher: &Dispatcher, text: &str) -> Option<String> {
    let parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            let reply =
                JsonRpcReply::failure(Value::Null, PARSE_ERROR, format!("parse error: {}", e));
            return Some(encode(&reply));
        }
    };

    match parsed {
        Value::Array(entries) => {
            if entries.is_empty() {
                let reply =
                    JsonRpcReply::failure(Value::Null, INVALID_REQUEST, "empty batch");
                return Some(encode(&reply));
            }

            // join_all keeps positional order while the entries run
            // concurrently; notifications collapse out of the reply array.
            let replies: Vec<JsonRpcReply> =
                join_all(entries.into_iter().map(|entry| process_one(dispatcher, entry)))
                    .await
                    .into_iter()
                    .flatten()
                    .collect();

            if replies.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&replies).unwrap_or_default())
            }
        }
        single => process_one(dispatcher, single).await.map(|r| encode(&r)),
    }
}

/// Validate one envelope, dispatch it, and build its reply. Returns `None`
/// for well-formed notifications.
async fn process_one(dispatcher: &Dispatcher, entry: Value) -> Option<JsonRpcReply> {
    let envelope: JsonRpcEnvelope = match serde_json::from_value(entry) {
        Ok(env) => env,
        Err(e) => {
            return Some(JsonRpcReply::failure(
                Value::Null,
                INVALID_REQUEST,
                format!("invalid request: {}", e),
            ));
        }
    };

    if envelope.jsonrpc.as_deref() != Some("2.0") {
        return Some(JsonRpcReply::failure(
            envelope.id.unwrap_or(Value::Null),
            INVALID_REQUEST,
            "jsonrpc must be \"2.0\"",
        ));
    }

    let notification = envelope.is_notification();
    let correlation = match correlation_from_id(envelope.id.as_ref()) {
        Ok(correlation) => correlation,
        Err(reply) => return Some(reply),
    };

    let params = match envelope.params {
        None => Params::None,
        Some(value) => match Params::from_value(value) {
            Some(params) => params,
            None => {
                return Some(JsonRpcReply::failure(
                    envelope.id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    "params must be an array or object",
                ));
            }
        },
    };

    let response = dispatcher
        .dispatch(RpcRequest {
            method: envelope.method,
            params,
            correlation,
            origin: TransportKind::JsonRpc,
        })
        .await;

    if notification {
        return None;
    }

    let id = id_value(&response.correlation);
    Some(match response.outcome {
        Ok(result) => JsonRpcReply::success(id, result),
        Err(fault) => JsonRpcReply::failure(id, error_code(fault.kind), fault.message),
    })
}

/// Map the wire id onto a correlation id. A present id must be a string,
/// an integer, or null.
fn correlation_from_id(id: Option<&Value>) -> Result<CorrelationId, JsonRpcReply> {
    match id {
        None | Some(Value::Null) => Ok(CorrelationId::None),
        Some(Value::String(s)) => Ok(CorrelationId::Text(s.clone())),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(CorrelationId::Number(i)),
            None => Err(JsonRpcReply::failure(
                Value::Null,
                INVALID_REQUEST,
                "id must be an integer, a string, or null",
            )),
        },
        Some(_) => Err(JsonRpcReply::failure(
            Value::Null,
            INVALID_REQUEST,
            "id must be an integer, a string, or null",
        )),
    }
}

fn id_value(correlation: &CorrelationId) -> Value {
    match correlation {
        CorrelationId::None => Value::Null,
        CorrelationId::Number(n) => Value::from(*n),
        CorrelationId::Text(s) => Value::from(s.clone()),
    }
}

fn encode(reply: &JsonRpcReply) -> String {
    serde_json::to_string(reply).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use manifold_core::{handler_fn, HandlerError, RegistryBuilder};
    use serde_json::json;

    fn test_dispatcher() -> Dispatcher {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                "echo",
                handler_fn(|params: Params| async move { Ok(params.into_value()) }),
            )
            .unwrap();
        builder
            .register(
                "slow",
                handler_fn(|_params: Params| async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(json!("slow done"))
                }),
            )
            .unwrap();
        builder
            .register(
                "fast",
                handler_fn(|_params: Params| async move { Ok(json!("fast done")) }),
            )
            .unwrap();
        builder
            .register(
                "fail",
                handler_fn(|_params: Params| async move {
                    Err(HandlerError::Failed("broken".to_string()))
                }),
            )
            .unwrap();
        Dispatcher::new(Arc::new(builder.build()))
    }

    #[tokio::test]
    async fn single_call_round_trips() {
        let dispatcher = test_dispatcher();
        let frame = r#"{"jsonrpc":"2.0","method":"echo","params":{"x":42},"id":1}"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value, json!({"jsonrpc":"2.0","result":{"x":42},"id":1}));
    }

    #[tokio::test]
    async fn malformed_json_yields_parse_error_with_null_id() {
        let dispatcher = test_dispatcher();
        let reply = handle_frame(&dispatcher, "{not json").await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["error"]["code"], json!(PARSE_ERROR));
        assert_eq!(value["id"], Value::Null);
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let dispatcher = test_dispatcher();
        let frame = r#"{"jsonrpc":"2.0","method":"missing","id":5}"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["error"]["code"], json!(-32601));
        assert_eq!(value["id"], json!(5));
    }

    #[tokio::test]
    async fn wrong_version_is_invalid_request() {
        let dispatcher = test_dispatcher();
        let frame = r#"{"jsonrpc":"1.0","method":"echo","id":5}"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["error"]["code"], json!(INVALID_REQUEST));
    }

    #[tokio::test]
    async fn notification_produces_no_reply() {
        let dispatcher = test_dispatcher();
        let frame = r#"{"jsonrpc":"2.0","method":"echo","params":[1]}"#;
        assert!(handle_frame(&dispatcher, frame).await.is_none());
    }

    #[tokio::test]
    async fn batch_replies_are_positional_regardless_of_completion_order() {
        let dispatcher = test_dispatcher();
        let frame = r#"[
            {"jsonrpc":"2.0","method":"slow","id":1},
            {"jsonrpc":"2.0","method":"fast","id":2}
        ]"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["result"], json!("slow done"));
        assert_eq!(entries[0]["id"], json!(1));
        assert_eq!(entries[1]["result"], json!("fast done"));
        assert_eq!(entries[1]["id"], json!(2));
    }

    #[tokio::test]
    async fn batch_of_notifications_produces_no_reply() {
        let dispatcher = test_dispatcher();
        let frame = r#"[
            {"jsonrpc":"2.0","method":"fast"},
            {"jsonrpc":"2.0","method":"fast"}
        ]"#;
        assert!(handle_frame(&dispatcher, frame).await.is_none());
    }

    #[tokio::test]
    async fn empty_batch_is_invalid_request() {
        let dispatcher = test_dispatcher();
        let reply = handle_frame(&dispatcher, "[]").await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["error"]["code"], json!(INVALID_REQUEST));
    }

    #[tokio::test]
    async fn handler_failure_maps_to_internal_error() {
        let dispatcher = test_dispatcher();
        let frame = r#"{"jsonrpc":"2.0","method":"fail","id":9}"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["error"]["code"], json!(-32603));
        assert_eq!(value["error"]["message"], json!("broken"));
        assert_eq!(value["id"], json!(9));
    }

    #[tokio::test]
    async fn mixed_batch_skips_notification_entries() {
        let dispatcher = test_dispatcher();
        let frame = r#"[
            {"jsonrpc":"2.0","method":"fast","id":"a"},
            {"jsonrpc":"2.0","method":"fast"},
            {"jsonrpc":"2.0","method":"missing","id":"b"}
        ]"#;
        let reply = handle_frame(&dispatcher, frame).await.unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["id"], json!("a"));
        assert_eq!(entries[1]["error"]["code"], json!(-32601));
    }
}
