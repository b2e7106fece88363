// crates/manifold-services/src/echo.rs
//
// The smallest possible operation: return the argument unchanged. A lone
// named or positional argument is unwrapped, so `echo({"x": 42})` answers
// `42` rather than the wrapping structure.

use manifold_core::{handler_fn, Params, RegistryBuilder, RegistryError};
use serde_json::Value;

pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.register(
        "echo",
        handler_fn(|params: Params| async move { Ok(unwrap_single(params)) }),
    )
}

fn unwrap_single(params: Params) -> Value {
    match params {
        Params::Named(map) if map.len() == 1 => {
            map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null)
        }
        Params::Positional(mut items) if items.len() == 1 => items.remove(0),
        other => other.into_value(),
    }
}
