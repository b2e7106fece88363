// crates/manifold-grpc/src/service.rs
//
// Hand-written tonic service: accept an HTTP/2 request on
// /manifold.v1.Manifold/{method}, decode the JSON payload, dispatch, and
// answer with the JSON result plus grpc-status headers. This is the
// pattern for defining tonic services without proto codegen.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tonic::transport::Server;
use tonic::Status;

use manifold_core::{CorrelationId, Dispatcher, Params, RpcRequest, TransportKind};

use crate::status::{grpc_status, GRPC_INVALID_ARGUMENT, GRPC_OK, GRPC_UNIMPLEMENTED};

/// Fully-qualified gRPC service name; tonic routes on this prefix.
pub const SERVICE_NAME: &str = "manifold.v1.Manifold";

// ---------------------------------------------------------------------------
// GrpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the gRPC listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

#[derive(Debug, Error)]
pub enum GrpcError {
    #[error("invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// gRPC listener wrapping the hand-written service in a tonic server.
pub struct GrpcListener {
    config: GrpcConfig,
    dispatcher: Arc<Dispatcher>,
}

impl GrpcListener {
    pub fn new(config: GrpcConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    pub async fn serve(self) -> Result<(), GrpcError> {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        tracing::info!("gRPC listener on {}", addr);

        Server::builder()
            .accept_http1(true)
            .add_service(ManifoldGrpcService::new(self.dispatcher))
            .serve(addr)
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The tonic service. Routes `/manifold.v1.Manifold/{method}` to the
/// operation named by `{method}` ('.' spells '/' in operation names, so
/// `secrets.manage` calls `secrets/manage`).
#[derive(Clone)]
pub struct ManifoldGrpcService {
    dispatcher: Arc<Dispatcher>,
    next_call: Arc<AtomicI64>,
}

impl ManifoldGrpcService {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            next_call: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl std::fmt::Debug for ManifoldGrpcService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifoldGrpcService").finish()
    }
}

impl tonic::server::NamedService for ManifoldGrpcService {
    const NAME: &'static str = SERVICE_NAME;
}

impl<B> tower_service::Service<http::Request<B>> for ManifoldGrpcService
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let correlation = self.next_call.fetch_add(1, Ordering::Relaxed);
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let operation = match path_to_operation(&path) {
                Some(op) => op,
                None => {
                    let message = format!("unknown method: {}", path);
                    return Ok(build_response(
                        GRPC_UNIMPLEMENTED,
                        Some(&message),
                        error_body(&message),
                    ));
                }
            };

            let body_bytes = match collect_body(req.into_body()).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let message = format!("failed to read request body: {}", e);
                    tracing::error!("{}", message);
                    return Ok(build_response(
                        GRPC_INVALID_ARGUMENT,
                        Some(&message),
                        error_body(&message),
                    ));
                }
            };

            let reply = process_call(&dispatcher, correlation, operation, &body_bytes).await;
            Ok(build_response(
                reply.status,
                reply.message.as_deref(),
                reply.body,
            ))
        })
    }
}

// ---------------------------------------------------------------------------
// Call processing
// ---------------------------------------------------------------------------

/// Outcome of one call at the wire level.
pub struct CallReply {
    pub status: u32,
    pub message: Option<String>,
    pub body: Vec<u8>,
}

/// Decode the payload, dispatch, and encode the reply. A payload that
/// fails to parse is answered here and never reaches the dispatcher.
pub async fn process_call(
    dispatcher: &Dispatcher,
    correlation: i64,
    operation: String,
    body: &[u8],
) -> CallReply {
    let value: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                let message = format!("invalid JSON payload: {}", e);
                return CallReply {
                    status: GRPC_INVALID_ARGUMENT,
                    message: Some(message.clone()),
                    body: error_body(&message),
                };
            }
        }
    };

    let params = match Params::from_value(value) {
        Some(params) => params,
        None => {
            let message = "payload must be a JSON object or array".to_string();
            return CallReply {
                status: GRPC_INVALID_ARGUMENT,
                message: Some(message.clone()),
                body: error_body(&message),
            };
        }
    };

    let response = dispatcher
        .dispatch(RpcRequest {
            method: operation,
            params,
            correlation: CorrelationId::Number(correlation),
            origin: TransportKind::Grpc,
        })
        .await;

    match response.outcome {
        Ok(result) => CallReply {
            status: GRPC_OK,
            message: None,
            body: serde_json::to_vec(&result).unwrap_or_default(),
        },
        Err(fault) => CallReply {
            status: grpc_status(fault.kind),
            message: Some(fault.message.clone()),
            body: error_body(&fault.message),
        },
    }
}

/// Map a request path to an operation name.
pub fn path_to_operation(path: &str) -> Option<String> {
    let rest = path.strip_prefix('/')?;
    let (service, method) = rest.split_once('/')?;
    if service != SERVICE_NAME || method.is_empty() {
        return None;
    }
    Some(method.replace('.', "/"))
}

fn error_body(message: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({ "error": message })).unwrap_or_default()
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response carrying the JSON body and gRPC status headers.
fn build_response(
    status: u32,
    message: Option<&str>,
    json: Vec<u8>,
) -> http::Response<tonic::body::BoxBody> {
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut builder = http::Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .header("grpc-status", status.to_string());

    if let Some(message) = message {
        builder = builder.header("grpc-message", sanitize_header(message));
    }

    builder.body(body).unwrap()
}

/// Header values must be visible ASCII; anything else is dropped.
fn sanitize_header(message: &str) -> String {
    message
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifold_core::{handler_fn, HandlerError, RegistryBuilder};

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
                "secrets/manage",
                handler_fn(|_params: Params| async move {
                    Err(HandlerError::Failed("vault sealed".to_string()))
                }),
            )
            .unwrap();
        Dispatcher::new(Arc::new(builder.build()))
    }

    #[test]
    fn path_routing_spells_slash_as_dot() {
        assert_eq!(
            path_to_operation("/manifold.v1.Manifold/secrets.manage").as_deref(),
            Some("secrets/manage")
        );
        assert_eq!(
            path_to_operation("/manifold.v1.Manifold/echo").as_deref(),
            Some("echo")
        );
        assert_eq!(path_to_operation("/other.Service/echo"), None);
        assert_eq!(path_to_operation("/manifold.v1.Manifold/"), None);
        assert_eq!(path_to_operation("no-slash"), None);
    }

    #[tokio::test]
    async fn unary_call_round_trips() {
        let dispatcher = test_dispatcher();
        let reply =
            process_call(&dispatcher, 1, "echo".to_string(), br#"{"x":42}"#).await;
        assert_eq!(reply.status, GRPC_OK);
        let value: Value = serde_json::from_slice(&reply.body).unwrap();
        assert_eq!(value, json!({"x": 42}));
    }

    #[tokio::test]
    async fn invalid_json_payload_is_answered_locally() {
        let dispatcher = test_dispatcher();
        let reply = process_call(&dispatcher, 2, "echo".to_string(), b"{oops").await;
        assert_eq!(reply.status, GRPC_INVALID_ARGUMENT);
    }

    #[tokio::test]
    async fn scalar_payload_is_rejected() {
        let dispatcher = test_dispatcher();
        let reply = process_call(&dispatcher, 3, "echo".to_string(), b"42").await;
        assert_eq!(reply.status, GRPC_INVALID_ARGUMENT);
    }

    #[tokio::test]
    async fn unknown_operation_is_unimplemented() {
        let dispatcher = test_dispatcher();
        let reply = process_call(&dispatcher, 4, "missing".to_string(), b"{}").await;
        assert_eq!(reply.status, GRPC_UNIMPLEMENTED);
    }

    #[tokio::test]
    async fn handler_failure_is_internal() {
        let dispatcher = test_dispatcher();
        let reply =
            process_call(&dispatcher, 5, "secrets/manage".to_string(), b"{}").await;
        assert_eq!(reply.status, crate::status::GRPC_INTERNAL);
        assert_eq!(reply.message.as_deref(), Some("vault sealed"));
    }

    #[test]
    fn header_sanitization_strips_control_chars() {
        assert_eq!(sanitize_header("a\r\nb"), "ab");
    }
}
