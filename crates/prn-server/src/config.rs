use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use prn_keys::layout::{DEFAULT_BUCKET, DEFAULT_HOST_SUFFIX};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Hosts allowed to make cross-origin requests, without scheme or port.
pub const DEFAULT_CORS_ORIGINS: &str =
    r"([a-z0-9\-\.]+\.zooniverse\.org|prn-maps\.planetaryresponsenetwork\.org)";

/// Server settings.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes. Environment overrides are applied on top by [`ServerConfig::apply_env`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory backing the object store.
    pub store_root: PathBuf,
    pub bucket_name: String,
    pub url_host_suffix: String,
    /// Host pattern for allowed CORS origins.
    pub cors_origin_pattern: String,
    pub basic_auth_user: String,
    pub basic_auth_pass: String,
    /// Reported by the health endpoint.
    pub commit_id: String,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 9292)),
            store_root: PathBuf::from("./bucket"),
            bucket_name: DEFAULT_BUCKET.into(),
            url_host_suffix: DEFAULT_HOST_SUFFIX.into(),
            cors_origin_pattern: DEFAULT_CORS_ORIGINS.into(),
            basic_auth_user: "prn".into(),
            basic_auth_pass: "api".into(),
            commit_id: "unknown".into(),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is normally `|name| std::env::var(name).ok()`.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        if let Some(bucket) = lookup("BUCKET_NAME") {
            self.bucket_name = bucket;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors_origin_pattern = origins;
        }
        if let Some(user) = lookup("BASIC_AUTH_USERNAME") {
            self.basic_auth_user = user;
        }
        if let Some(pass) = lookup("BASIC_AUTH_PASSWORD") {
            self.basic_auth_pass = pass;
        }
        if let Some(root) = lookup("PRN_STORE_ROOT") {
            self.store_root = PathBuf::from(root);
        }
        if let Some(addr) = lookup("PRN_BIND_ADDR") {
            self.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("PRN_BIND_ADDR {addr:?}: {e}")))?;
        }
        if let Some(commit) = lookup("COMMIT_ID") {
            self.commit_id = commit;
        }
        Ok(self)
    }

    /// Anchored origin matcher: scheme, the configured host pattern, and an
    /// optional port.
    pub fn cors_regex(&self) -> ServerResult<Regex> {
        Regex::new(&format!(r"^https?://(?:{})(:\d+)?$", self.cors_origin_pattern))
            .map_err(|e| ServerError::Config(format!("invalid CORS origin pattern: {e}")))
    }
}
