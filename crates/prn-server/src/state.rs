use std::sync::Arc;

use prn_layers::LayerRepository;
use regex::Regex;

use crate::auth::{AuthProvider, BasicAuth};
use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    repo: Arc<LayerRepository>,
    auth: Arc<dyn AuthProvider>,
    config: Arc<ServerConfig>,
    cors_origins: Regex,
}

impl AppState {
    /// State with basic auth taken from `config`.
    pub fn new(config: ServerConfig, repo: Arc<LayerRepository>) -> ServerResult<Self> {
        let auth = Arc::new(BasicAuth::new(
            config.basic_auth_user.clone(),
            config.basic_auth_pass.clone(),
        ));
        Self::with_auth(config, repo, auth)
    }

    pub fn with_auth(
        config: ServerConfig,
        repo: Arc<LayerRepository>,
        auth: Arc<dyn AuthProvider>,
    ) -> ServerResult<Self> {
        Ok(Self {
            cors_origins: config.cors_regex()?,
            repo,
            auth,
            config: Arc::new(config),
        })
    }

    pub fn repo(&self) -> &Arc<LayerRepository> {
        &self.repo
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn cors_origins(&self) -> &Regex {
        &self.cors_origins
    }
}
