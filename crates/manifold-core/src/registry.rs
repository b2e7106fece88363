// crates/manifold-core/src/registry.rs
//
// Service registry: operation name -> handler. Built once during startup
// through `RegistryBuilder`, then frozen. The built registry is shared via
// `Arc` and read concurrently without locking; no registration happens
// after a listener starts accepting.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::handler::Handler;

/// Mutable registration phase. Consumed by `build()`.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an operation name to a handler.
    ///
    /// Fails with `DuplicateOperation` if the name is already bound; the
    /// earlier binding is left in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateOperation(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Freeze the registry. No further registration is possible.
    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            handlers: self.handlers,
        }
    }
}

/// Immutable operation table, safe for concurrent lookup.
pub struct ServiceRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl ServiceRegistry {
    /// Look up the handler bound to `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered operation names, sorted for stable startup logging.
    pub fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("operations", &self.operation_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handler::handler_fn;
    use crate::message::Params;
    use serde_json::json;

    fn echo_handler() -> Arc<dyn Handler> {
        handler_fn(|params: Params| async move { Ok(params.into_value()) })
    }

    #[test]
    fn duplicate_registration_fails_and_keeps_prior_binding() {
        let mut builder = RegistryBuilder::new();
        builder.register("echo", echo_handler()).unwrap();

        let err = builder.register("echo", echo_handler()).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateOperation("echo".to_string()));

        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("echo").is_ok());
    }

    #[test]
    fn resolve_unknown_operation_fails() {
        let registry = RegistryBuilder::new().build();
        let err = match registry.resolve("missing") {
            Ok(_) => panic!("expected resolve to fail for unknown operation"),
            Err(e) => e,
        };
        assert_eq!(err, RegistryError::UnknownOperation("missing".to_string()));
    }

    #[tokio::test]
    async fn resolve_returns_the_same_handler_every_time() {
        let mut builder = RegistryBuilder::new();
        builder.register("echo", echo_handler()).unwrap();
        let registry = builder.build();

        let first = registry.resolve("echo").unwrap();
        let second = registry.resolve("echo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let result = first
            .invoke(Params::from_value(json!([1])).unwrap())
            .await
            .unwrap();
        assert_eq!(result, json!([1]));
    }

    #[test]
    fn operation_names_are_sorted() {
        let mut builder = RegistryBuilder::new();
        builder.register("b", echo_handler()).unwrap();
        builder.register("a", echo_handler()).unwrap();
        let registry = builder.build();
        assert_eq!(registry.operation_names(), vec!["a", "b"]);
    }

    #[test]
    fn handler_error_display() {
        let err = HandlerError::InvalidParams("missing field".to_string());
        assert_eq!(err.to_string(), "invalid params: missing field");
    }
}
