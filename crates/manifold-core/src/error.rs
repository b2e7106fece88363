// crates/manifold-core/src/error.rs

use thiserror::Error;

/// Errors raised by the service registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An operation name was registered twice. Startup-fatal: the registry
    /// build must fail rather than silently overwrite the earlier handler.
    #[error("duplicate operation: {0}")]
    DuplicateOperation(String),

    /// No handler is bound to the requested operation name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

/// Errors a handler may raise. The dispatcher converts these into the
/// protocol-neutral fault descriptor; they never cross the transport
/// boundary as raw errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The supplied arguments did not match the operation's input shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A domain error or unexpected fault inside the handler.
    #[error("{0}")]
    Failed(String),
}
