use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the two transfer loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Size of a single connection read in bytes (default: 1024).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Connection establishment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address to bind in listen mode (default: "0.0.0.0").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Connect timeout per resolved address in seconds (default: 10).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Disable Nagle so typed lines go out immediately (default: true).
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset (default: "warn").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_buffer_size() -> usize {
    1024
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_connect_timeout() -> u32 {
    10
}

fn default_nodelay() -> bool {
    true
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            connect_timeout_seconds: default_connect_timeout(),
            nodelay: default_nodelay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
