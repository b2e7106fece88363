// crates/manifold-core/src/handler.rs
//
// The handler capability: one polymorphic unit of behavior bound to exactly
// one operation name. Handlers are trait objects owned by the registry for
// the process lifetime and must be safe to invoke concurrently.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HandlerError;
use crate::message::Params;

/// A registered operation's behavior: pure function of arguments to a JSON
/// result or a `HandlerError`.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, params: Params) -> Result<Value, HandlerError>;
}

/// Adapter making an async closure over raw `Params` into a `Handler`.
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Params) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send,
{
    async fn invoke(&self, params: Params) -> Result<Value, HandlerError> {
        (self.0)(params).await
    }
}

/// Wrap an async closure taking raw `Params` as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wrap an async function over a typed request struct as a handler.
///
/// Named params deserialize into the request type; a shape mismatch
/// surfaces as `HandlerError::InvalidParams` rather than a crash. Absent
/// params deserialize as an empty object so operations with no required
/// fields accept an empty call.
pub fn typed<Req, Resp, F, Fut>(f: F) -> Arc<dyn Handler>
where
    Req: serde::de::DeserializeOwned + Send + 'static,
    Resp: serde::Serialize + 'static,
    F: Fn(Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, HandlerError>> + Send + 'static,
{
    handler_fn(move |params: Params| {
        let f = f.clone();
        async move {
            let value = match params.into_value() {
                Value::Null => Value::Object(serde_json::Map::new()),
                other => other,
            };
            let request: Req = serde_json::from_value(value)
                .map_err(|e| HandlerError::InvalidParams(e.to_string()))?;
            let response = f(request).await?;
            serde_json::to_value(response).map_err(|e| HandlerError::Failed(e.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Deserialize)]
    struct AddRequest {
        a: i64,
        b: i64,
    }

    #[derive(Serialize)]
    struct AddResponse {
        sum: i64,
    }

    async fn handle_add(req: AddRequest) -> Result<AddResponse, HandlerError> {
        Ok(AddResponse { sum: req.a + req.b })
    }

    #[tokio::test]
    async fn typed_handler_deserializes_named_params() {
        let handler = typed(handle_add);
        let params = Params::from_value(json!({"a": 2, "b": 3})).unwrap();
        let result = handler.invoke(params).await.unwrap();
        assert_eq!(result, json!({"sum": 5}));
    }

    #[tokio::test]
    async fn typed_handler_rejects_bad_shape() {
        let handler = typed(handle_add);
        let params = Params::from_value(json!({"a": "two"})).unwrap();
        let err = handler.invoke(params).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }
}
