// crates/manifold-grpc/src/status.rs
//
// Fault -> gRPC status code mapping.

use manifold_core::FaultKind;

pub const GRPC_OK: u32 = 0;
pub const GRPC_INVALID_ARGUMENT: u32 = 3;
pub const GRPC_UNIMPLEMENTED: u32 = 12;
pub const GRPC_INTERNAL: u32 = 13;

/// Map a protocol-neutral fault kind onto its gRPC status code.
pub fn grpc_status(kind: FaultKind) -> u32 {
    match kind {
        FaultKind::UnknownOperation => GRPC_UNIMPLEMENTED,
        FaultKind::InvalidParams => GRPC_INVALID_ARGUMENT,
        FaultKind::HandlerFailure => GRPC_INTERNAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_kinds_map_to_grpc_codes() {
        assert_eq!(grpc_status(FaultKind::UnknownOperation), 12);
        assert_eq!(grpc_status(FaultKind::InvalidParams), 3);
        assert_eq!(grpc_status(FaultKind::HandlerFailure), 13);
    }
}
