// crates/manifold-core/src/lib.rs
//
// manifold-core: canonical request/response model, service registry, and
// dispatcher for the Manifold RPC service.
//
// This is the leaf crate every transport crate depends on. It knows nothing
// about wire formats: adapters translate their protocol into `RpcRequest`,
// hand it to the `Dispatcher`, and translate the resulting `RpcResponse`
// back out. The registry is built once at startup and immutable afterwards,
// so concurrent dispatch needs no locking.

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use manifold_core::Dispatcher;`

// Message types
pub use message::{CorrelationId, Fault, FaultKind, Params, RpcRequest, RpcResponse, TransportKind};

// Error types
pub use error::{HandlerError, RegistryError};

// Handler trait and constructors
pub use handler::{handler_fn, typed, Handler};

// Registry
pub use registry::{RegistryBuilder, ServiceRegistry};

// Dispatcher
pub use dispatch::Dispatcher;
