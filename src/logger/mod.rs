//! Logger module
//!
//! Provides logging utilities for the gateway including:
//! - Startup banner and readiness line
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, Disposition};

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_startup_config(config: &Config) {
    write_info("======================================");
    write_info("[SERVER] Starting with configuration:");
    write_info(&format!("[SERVER] Mode: {}", config.deployment.mode));
    write_info(&format!("[SERVER] Host: {}", config.server.host));
    write_info(&format!("[SERVER] Port: {}", config.server.port));
    write_info(&format!(
        "[SERVER] Canonical host: {}",
        config.deployment.canonical_host
    ));
    write_info(&format!(
        "[SERVER] Secure forwarding: {}",
        config.deployment.mode.is_secure()
    ));
    write_info(&format!("[SERVER] Render upstream: {}", config.render.upstream));
    write_info(&format!(
        "[SERVER] Backend URL: {}",
        config.render.backend_url.as_deref().unwrap_or("(unset)")
    ));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("[SERVER] Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("[SERVER] Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_asset_rule(prefix: &str, dir: &std::path::Path, strip_prefix: bool) {
    let mode = if strip_prefix { "strip" } else { "keep" };
    write_info(&format!("[ASSETS] {prefix} -> {} ({mode} prefix)", dir.display()));
}

/// Readiness line the supervisor waits for; printed once the socket is bound
pub fn log_ready(addr: &SocketAddr) {
    write_info(&format!("> Ready on http://{addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
