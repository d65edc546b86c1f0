// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Runtime mode of the deployment
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    /// Production deployments sit behind a TLS-terminating proxy
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Deployment configuration driving forwarded-header normalization
#[derive(Debug, Deserialize, Clone)]
pub struct DeploymentConfig {
    pub mode: RuntimeMode,
    /// Externally visible hostname substituted for internal hosts
    pub canonical_host: String,
    #[serde(default = "default_internal_host_markers")]
    pub internal_host_markers: Vec<String>,
}

fn default_internal_host_markers() -> Vec<String> {
    vec![
        "0.0.0.0".to_string(),
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ]
}

/// Static asset configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AssetsConfig {
    /// Trusted root all rule directories resolve under (defaults to cwd)
    #[serde(default)]
    pub root: Option<String>,
    /// Ordered prefix rules; built-in defaults apply when empty
    #[serde(default)]
    pub rules: Vec<AssetRuleConfig>,
    /// Extra or overriding extension -> MIME entries, keyed without the dot
    #[serde(default)]
    pub content_types: HashMap<String, String>,
}

/// One prefix -> directory rule as written in the config file
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AssetRuleConfig {
    pub prefix: String,
    /// Directory relative to `assets.root`
    pub dir: String,
    #[serde(default)]
    pub strip_prefix: bool,
}

/// Rendering engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    /// Address of the rendering engine's own HTTP listener
    pub upstream: String,
    /// Backend API URL handed to the rendering engine, never parsed here
    #[serde(default)]
    pub backend_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for a client to send request headers; 0 disables
    pub header_read_timeout: u64,
    pub max_connections: Option<u64>,
    /// Grace period for in-flight connections on shutdown, in seconds
    pub shutdown_timeout: u64,
}
