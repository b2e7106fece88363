// crates/manifold-daemon/src/main.rs
//
// Binary entrypoint for the Manifold daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, builds
// the service registry, and spawns one listener task per enabled
// transport. Which transports exist at all is a compile-time choice via
// the json-rpc-server / soap-server / grpc-server features; the core
// registry and dispatcher are always built.

mod config;

use std::sync::Arc;

use clap::Parser;

use config::DaemonConfig;
use manifold_core::{Dispatcher, RegistryBuilder};

/// Manifold daemon — one operation registry served over JSON-RPC, SOAP,
/// and gRPC.
#[derive(Parser, Debug)]
#[command(name = "manifold-daemon", version, about = "Manifold multi-protocol RPC daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "manifold.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the
    // file is not found.
    let daemon_config = match DaemonConfig::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!(
                "Could not load config from {}: {}. Using defaults.",
                args.config, e
            );
            DaemonConfig::default()
        }
    };

    // Initialize tracing subscriber for structured logging. RUST_LOG
    // overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    tracing::info!("Manifold daemon v{}", env!("CARGO_PKG_VERSION"));

    // ---------------------------------------------------------------
    // Build the service registry. Registration happens strictly before
    // any listener accepts; the registry is immutable afterwards.
    // ---------------------------------------------------------------
    let mut builder = RegistryBuilder::new();
    manifold_services::register_all(&mut builder)?;
    let registry = Arc::new(builder.build());

    for name in registry.operation_names() {
        tracing::info!(operation = name, "registered operation");
    }
    tracing::info!("{} operations registered", registry.len());

    let dispatcher = Arc::new(Dispatcher::new(registry));

    // ---------------------------------------------------------------
    // Spawn one listener task per enabled transport. Listeners share
    // only the dispatcher; a failing listener never takes down the
    // others.
    // ---------------------------------------------------------------
    let mut listeners: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    #[cfg(feature = "json-rpc-server")]
    {
        if daemon_config.json_rpc.enabled {
            let listener = manifold_jsonrpc::JsonRpcListener::new(
                manifold_jsonrpc::JsonRpcConfig {
                    host: daemon_config.json_rpc.host.clone(),
                    port: daemon_config.json_rpc.port,
                },
                dispatcher.clone(),
            );
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.serve().await {
                    tracing::error!("JSON-RPC listener failed: {}", e);
                }
            }));
        } else {
            tracing::info!("JSON-RPC listener disabled by config");
        }
    }

    #[cfg(feature = "soap-server")]
    {
        if daemon_config.soap.enabled {
            let listener = manifold_soap::SoapListener::new(
                manifold_soap::SoapConfig {
                    host: daemon_config.soap.host.clone(),
                    port: daemon_config.soap.port,
                },
                dispatcher.clone(),
            );
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.serve().await {
                    tracing::error!("SOAP listener failed: {}", e);
                }
            }));
        } else {
            tracing::info!("SOAP listener disabled by config");
        }
    }

    #[cfg(feature = "grpc-server")]
    {
        if daemon_config.grpc.enabled {
            let listener = manifold_grpc::GrpcListener::new(
                manifold_grpc::GrpcConfig {
                    host: daemon_config.grpc.host.clone(),
                    port: daemon_config.grpc.port,
                },
                dispatcher.clone(),
            );
            listeners.push(tokio::spawn(async move {
                if let Err(e) = listener.serve().await {
                    tracing::error!("gRPC listener failed: {}", e);
                }
            }));
        } else {
            tracing::info!("gRPC listener disabled by config");
        }
    }

    if listeners.is_empty() {
        tracing::warn!("no transport listeners enabled; dispatcher is idle");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    for listener in &listeners {
        listener.abort();
    }

    Ok(())
}
