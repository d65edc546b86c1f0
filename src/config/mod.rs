// Configuration module entry point
// Loads layered configuration and builds the shared runtime state

mod env;
mod state;
mod types;

use std::net::SocketAddr;

pub use env::EnvLookup;
pub use state::AppState;
pub use types::{AssetsConfig, Config, DeploymentConfig};
#[cfg(test)]
pub use types::{AssetRuleConfig, RuntimeMode};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Layering, lowest to highest: built-in defaults, config file,
    /// `.env` file, process environment.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let lookup = EnvLookup::from_process(".env");
        Self::load_with(config_path, &lookup)
    }

    /// Load configuration with an explicit environment lookup
    pub fn load_with(config_path: &str, lookup: &EnvLookup) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("deployment.mode", "development")?
            .set_default("deployment.canonical_host", "localhost")?
            .set_default("render.upstream", "http://127.0.0.1:3001")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 5)?;

        let settings = lookup.apply(builder)?.build()?;
        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> EnvLookup {
        EnvLookup::from_map(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_with("does-not-exist", &lookup(&[])).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.deployment.mode, RuntimeMode::Development);
        assert_eq!(
            cfg.deployment.internal_host_markers,
            vec!["0.0.0.0", "localhost", "127.0.0.1"]
        );
        assert!(cfg.assets.rules.is_empty());
        assert_eq!(cfg.render.upstream, "http://127.0.0.1:3001");
        assert!(cfg.render.backend_url.is_none());
        assert_eq!(cfg.performance.shutdown_timeout, 5);
    }

    #[test]
    fn test_environment_overrides() {
        let env = lookup(&[
            ("APP_ENV", "production"),
            ("LISTEN_HOST", "127.0.0.1"),
            ("PORT", "4000"),
            ("CANONICAL_HOST", "shop.example.com"),
            ("BACKEND_URL", "http://10.0.0.5:80"),
            ("RENDER_UPSTREAM", "http://127.0.0.1:5000"),
        ]);
        let cfg = Config::load_with("does-not-exist", &env).unwrap();
        assert_eq!(cfg.deployment.mode, RuntimeMode::Production);
        assert!(cfg.deployment.mode.is_secure());
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:4000");
        assert_eq!(cfg.deployment.canonical_host, "shop.example.com");
        assert_eq!(cfg.render.backend_url.as_deref(), Some("http://10.0.0.5:80"));
        assert_eq!(cfg.render.upstream, "http://127.0.0.1:5000");
    }

    #[test]
    fn test_process_manager_variables() {
        let env = lookup(&[
            ("NODE_ENV", "production"),
            ("HOSTNAME", "127.0.0.2"),
            ("PORT", "3000"),
        ]);
        let cfg = Config::load_with("does-not-exist", &env).unwrap();
        assert_eq!(cfg.deployment.mode, RuntimeMode::Production);
        assert!(cfg.deployment.mode.is_secure());
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.2:3000");
    }

    #[test]
    fn test_explicit_variables_win_over_process_manager_ones() {
        let env = lookup(&[
            ("APP_ENV", "development"),
            ("NODE_ENV", "production"),
            ("LISTEN_HOST", "127.0.0.1"),
            ("HOSTNAME", "127.0.0.2"),
        ]);
        let cfg = Config::load_with("does-not-exist", &env).unwrap();
        assert_eq!(cfg.deployment.mode, RuntimeMode::Development);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn test_unknown_mode_is_development() {
        let cfg = Config::load_with("does-not-exist", &lookup(&[("APP_ENV", "staging")])).unwrap();
        assert_eq!(cfg.deployment.mode, RuntimeMode::Development);
    }

    #[test]
    fn test_unparsable_port_falls_back() {
        let cfg = Config::load_with("does-not-exist", &lookup(&[("PORT", "abc")])).unwrap();
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn test_file_rules_and_content_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[deployment]
mode = "production"
canonical_host = "example.org"

[assets]
root = "/srv/app"

[[assets.rules]]
prefix = "/static/"
dir = "dist"
strip_prefix = true

[assets.content_types]
txt = "text/plain; charset=utf-8"
"#
        )
        .unwrap();

        let stem = path.with_extension("");
        let cfg = Config::load_with(stem.to_str().unwrap(), &lookup(&[])).unwrap();
        assert_eq!(cfg.deployment.canonical_host, "example.org");
        assert_eq!(cfg.assets.root.as_deref(), Some("/srv/app"));
        assert_eq!(
            cfg.assets.rules,
            vec![AssetRuleConfig {
                prefix: "/static/".to_string(),
                dir: "dist".to_string(),
                strip_prefix: true,
            }]
        );
        assert_eq!(
            cfg.assets.content_types.get("txt").map(String::as_str),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_invalid_address() {
        let cfg = Config::load_with("does-not-exist", &lookup(&[("LISTEN_HOST", "not a host")]))
            .unwrap();
        assert!(cfg.get_socket_addr().is_err());
    }
}
