//! Error types
//!
//! Startup errors are fatal and end the process with a non-zero status so
//! the supervisor can restart it. Per-request failures never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address: {0}")]
    Address(String),

    #[error("invalid canonical host '{host}': {source}")]
    CanonicalHost {
        host: String,
        #[source]
        source: hyper::header::InvalidHeaderValue,
    },

    #[error("asset rule '{prefix}' -> '{dir}' {reason}")]
    AssetRule {
        prefix: String,
        dir: String,
        reason: &'static str,
    },

    #[error("cannot determine asset root: {0}")]
    AssetRoot(#[source] std::io::Error),

    #[error("invalid render upstream '{url}': {reason}")]
    RenderUpstream { url: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("failed to open log files: {0}")]
    Logger(#[source] std::io::Error),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
