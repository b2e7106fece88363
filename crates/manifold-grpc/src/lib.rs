// crates/manifold-grpc/src/lib.rs
//
// manifold-grpc: gRPC adapter and tonic listener.
//
// The service is hand-written on top of tonic's server infrastructure
// rather than generated from a proto file: the request path routes to the
// operation and message bodies are JSON-encoded parameter objects. Each
// unary call is one request/response pair; faults map onto gRPC status
// codes carried in the response headers.

pub mod service;
pub mod status;

pub use service::{
    path_to_operation, process_call, CallReply, GrpcConfig, GrpcListener, ManifoldGrpcService,
};
pub use status::{grpc_status, GRPC_INTERNAL, GRPC_INVALID_ARGUMENT, GRPC_OK, GRPC_UNIMPLEMENTED};
