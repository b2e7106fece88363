// crates/manifold-core/src/dispatch.rs
//
// The dispatcher: resolve the operation, invoke the handler, convert every
// failure into a fault descriptor. Exactly one response per request, with
// the correlation id preserved. A fault in one transport's request must not
// take down listeners serving other transports, so nothing a handler does
// escapes this boundary unconverted, panics included.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::error::HandlerError;
use crate::message::{Fault, RpcRequest, RpcResponse};
use crate::registry::ServiceRegistry;

/// Stateless dispatch core shared by all transport listeners. Holds only
/// the registry reference; concurrent `dispatch` calls are safe.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Run one request to completion and return its response.
    ///
    /// Never cancels a handler mid-flight; discarding an unwanted response
    /// (after a connection drop) is the caller's responsibility.
    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let RpcRequest {
            method,
            params,
            correlation,
            origin,
        } = request;

        let started = Instant::now();

        let outcome = match self.registry.resolve(&method) {
            Err(_) => Err(Fault::unknown_operation(&method)),
            Ok(handler) => {
                match AssertUnwindSafe(handler.invoke(params)).catch_unwind().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(HandlerError::InvalidParams(msg))) => Err(Fault::invalid_params(msg)),
                    Ok(Err(HandlerError::Failed(msg))) => Err(Fault::handler_failure(msg)),
                    Err(payload) => Err(Fault::handler_failure(panic_message(payload))),
                }
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => tracing::info!(
                method = %method,
                correlation = %correlation,
                transport = %origin,
                elapsed_ms,
                "dispatch ok"
            ),
            Err(fault) => tracing::warn!(
                method = %method,
                correlation = %correlation,
                transport = %origin,
                elapsed_ms,
                kind = ?fault.kind,
                error = %fault.message,
                "dispatch failed"
            ),
        }

        RpcResponse {
            correlation,
            outcome,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operations", &self.registry.len())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}
