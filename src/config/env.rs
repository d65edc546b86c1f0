// Environment override module
// Maps deployment environment variables onto configuration keys

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use crate::logger;

/// Environment variable -> config key mapping
const STRING_OVERRIDES: &[(&str, &str)] = &[
    ("CANONICAL_HOST", "deployment.canonical_host"),
    ("BACKEND_URL", "render.backend_url"),
    ("RENDER_UPSTREAM", "render.upstream"),
];

/// Snapshot of environment variables used for configuration
///
/// Process variables win over entries read from the `.env` file.
#[derive(Debug, Default, Clone)]
pub struct EnvLookup {
    vars: HashMap<String, String>,
}

impl EnvLookup {
    /// Capture the process environment layered over an optional dotenv file
    pub fn from_process(dotenv_path: &str) -> Self {
        let mut vars = if Path::new(dotenv_path).is_file() {
            match env_file_reader::read_file(dotenv_path) {
                Ok(map) => map,
                Err(e) => {
                    logger::log_warning(&format!(
                        "Ignoring unreadable env file '{dotenv_path}': {e}"
                    ));
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        vars.extend(std::env::vars());
        Self { vars }
    }

    #[cfg(test)]
    pub const fn from_map(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Apply overrides on top of file and default sources
    pub fn apply(
        &self,
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        for (var, key) in STRING_OVERRIDES {
            builder = builder.set_override_option(*key, self.get(var))?;
        }

        // LISTEN_HOST wins; HOSTNAME only counts as an IP literal since
        // container runtimes export it as the machine name
        let host = self.get("LISTEN_HOST").or_else(|| {
            self.get("HOSTNAME")
                .filter(|h| h.trim().parse::<IpAddr>().is_ok())
        });
        builder = builder.set_override_option("server.host", host.map(str::trim))?;

        // APP_ENV wins over NODE_ENV; anything but "production" runs in
        // development mode
        let mode = self.get("APP_ENV").or_else(|| self.get("NODE_ENV")).map(|v| {
            if v.trim().eq_ignore_ascii_case("production") {
                "production"
            } else {
                "development"
            }
        });
        builder = builder.set_override_option("deployment.mode", mode)?;

        // Invalid ports fall back to the configured value
        let port = self
            .get("PORT")
            .and_then(|p| p.trim().parse::<u16>().ok())
            .map(i64::from);
        builder = builder.set_override_option("server.port", port)?;

        Ok(builder)
    }
}
