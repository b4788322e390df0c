//! HTTP edge for PRN Maps.
//!
//! Public listings of events and approved layers, plus a `/pending` group
//! behind basic auth for uploads, approvals and reverts. Repository calls
//! run on the blocking pool.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, BasicAuth, Credentials, Identity, REALM};
pub use config::{ServerConfig, DEFAULT_CORS_ORIGINS};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::PrnServer;
pub use state::AppState;
