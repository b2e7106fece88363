// crates/manifold-services/src/lib.rs
//
// manifold-services: the operations the daemon serves. Each module owns
// its state behind its own lock and registers typed handlers; the
// transports never see any of this directly.

pub mod echo;
pub mod secrets;
pub mod tasks;

use manifold_core::{RegistryBuilder, RegistryError};

/// Register every built-in operation.
pub fn register_all(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    echo::register(builder)?;
    secrets::register(builder)?;
    tasks::register(builder)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_is_collision_free() {
        let mut builder = RegistryBuilder::new();
        register_all(&mut builder).unwrap();
        let registry = builder.build();
        assert!(registry.contains("echo"));
        assert!(registry.contains("secrets/manage"));
        assert!(registry.contains("tasks/create"));
    }
}
