use std::sync::Arc;

use prn_keys::PublicUrls;
use prn_layers::LayerRepository;
use prn_store::FsObjectStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// PRN Maps HTTP server over a filesystem-backed bucket.
pub struct PrnServer {
    config: ServerConfig,
}

impl PrnServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the store at `store_root` and assemble handler state.
    pub fn state(&self) -> ServerResult<AppState> {
        let store = FsObjectStore::open(&self.config.store_root)
            .map_err(|e| ServerError::Config(format!("cannot open store: {e}")))?;
        let urls = PublicUrls::new(self.config.bucket_name.clone())
            .with_host_suffix(self.config.url_host_suffix.clone());
        let repo = LayerRepository::new(Arc::new(store), urls);
        AppState::new(self.config.clone(), Arc::new(repo))
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(self.state()?))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            bucket = %self.config.bucket_name,
            store = %self.config.store_root.display(),
            "PRN Maps server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = PrnServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:9292".parse().unwrap());
    }

    #[test]
    fn router_builds_over_temp_store() {
        let dir = tempfile::tempdir().unwrap();
        let server = PrnServer::new(ServerConfig {
            store_root: dir.path().join("bucket"),
            ..ServerConfig::default()
        });
        assert!(server.router().is_ok());
    }

    #[test]
    fn bad_cors_pattern_fails_to_build() {
        let dir = tempfile::tempdir().unwrap();
        let server = PrnServer::new(ServerConfig {
            store_root: dir.path().to_path_buf(),
            cors_origin_pattern: "[".into(),
            ..ServerConfig::default()
        });
        assert!(matches!(server.router(), Err(ServerError::Config(_))));
    }
}
