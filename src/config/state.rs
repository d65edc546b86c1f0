// Application state module
// Immutable per-process state shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::error::StartupError;
use crate::handler::{AssetResponder, ForwardedPolicy};
use crate::render::RenderEngine;

/// Application state
///
/// Built once before the listener is bound and never mutated afterwards.
pub struct AppState {
    pub config: Config,
    pub forwarded: ForwardedPolicy,
    pub assets: AssetResponder,
    pub engine: Arc<dyn RenderEngine>,
}

impl AppState {
    /// Build the state around an already constructed rendering engine
    pub fn with_engine(config: &Config, engine: Arc<dyn RenderEngine>) -> Result<Self, StartupError> {
        let forwarded = ForwardedPolicy::from_config(&config.deployment).map_err(|source| {
            StartupError::CanonicalHost {
                host: config.deployment.canonical_host.clone(),
                source,
            }
        })?;
        let assets = AssetResponder::from_config(&config.assets)?;

        Ok(Self {
            config: config.clone(),
            forwarded,
            assets,
            engine,
        })
    }
}
