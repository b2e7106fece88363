// crates/manifold-daemon/src/config.rs
//
// Runtime configuration for the Manifold daemon.
// Loaded from a TOML file or populated with sensible defaults. Every
// section is optional; a protocol compiled in but disabled here is
// skipped at startup.

use serde::Deserialize;
use std::fs;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON-RPC (WebSocket) listener settings.
    #[serde(default)]
    pub json_rpc: JsonRpcSection,

    /// SOAP (HTTP) listener settings.
    #[serde(default)]
    pub soap: SoapSection,

    /// gRPC listener settings.
    #[serde(default)]
    pub grpc: GrpcSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_json_rpc_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoapSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_soap_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrpcSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_grpc_port")]
    pub port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_json_rpc_port() -> u16 {
    9001
}

fn default_soap_port() -> u16 {
    8080
}

fn default_grpc_port() -> u16 {
    50051
}

impl Default for JsonRpcSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_json_rpc_port(),
        }
    }
}

impl Default for SoapSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_soap_port(),
        }
    }
}

impl Default for GrpcSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_grpc_port(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_rpc: JsonRpcSection::default(),
            soap: SoapSection::default(),
            grpc: GrpcSection::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: DaemonConfig = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.json_rpc.enabled);
        assert_eq!(config.json_rpc.port, 9001);
        assert_eq!(config.soap.port, 8080);
        assert_eq!(config.grpc.port, 50051);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            log_level = "debug"

            [soap]
            enabled = false

            [grpc]
            port = 6000
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(!config.soap.enabled);
        assert_eq!(config.soap.host, "127.0.0.1");
        assert_eq!(config.grpc.port, 6000);
        assert!(config.grpc.enabled);
        assert!(config.json_rpc.enabled);
    }

    #[test]
    fn unparsable_config_is_an_error() {
        assert!(toml::from_str::<DaemonConfig>("log_level = 3").is_err());
    }
}
