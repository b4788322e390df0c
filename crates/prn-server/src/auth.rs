use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Realm announced in basic auth challenges.
pub const REALM: &str = "Protected Area";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn user(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Anonymous,
}

impl Credentials {
    /// Read basic credentials from the `Authorization` header. Anything
    /// missing or malformed is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse_basic)
            .unwrap_or(Self::Anonymous)
    }

    fn parse_basic(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve credentials to an identity, or fail with
    /// [`ServerError::Unauthorized`].
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// A single shared username and password.
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for BasicAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Basic { username, password }
                if constant_time_eq(username.as_bytes(), self.username.as_bytes())
                    & constant_time_eq(password.as_bytes(), self.password.as_bytes()) =>
            {
                Ok(Identity::user(username.clone()))
            }
            _ => Err(ServerError::Unauthorized),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware guarding the protected routes. Preflight requests pass
/// through untouched.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let credentials = Credentials::from_headers(request.headers());
    match state.auth().authenticate(&credentials).await {
        Ok(identity) => {
            tracing::debug!(user = %identity.name, path = %request.uri().path(), "authenticated");
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(?credentials, "authentication failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn parses_basic_header() {
        // "prn:api"
        assert_eq!(
            Credentials::from_headers(&headers("Basic cHJuOmFwaQ==")),
            Credentials::Basic {
                username: "prn".into(),
                password: "api".into()
            }
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let encoded = STANDARD.encode("user:pa:ss");
        assert_eq!(
            Credentials::from_headers(&headers(&format!("basic {encoded}"))),
            Credentials::Basic {
                username: "user".into(),
                password: "pa:ss".into()
            }
        );
    }

    #[test]
    fn malformed_headers_are_anonymous() {
        assert_eq!(Credentials::from_headers(&HeaderMap::new()), Credentials::Anonymous);
        assert_eq!(Credentials::from_headers(&headers("Bearer abc")), Credentials::Anonymous);
        assert_eq!(Credentials::from_headers(&headers("Basic !!!")), Credentials::Anonymous);
        let no_colon = STANDARD.encode("prnapi");
        assert_eq!(
            Credentials::from_headers(&headers(&format!("Basic {no_colon}"))),
            Credentials::Anonymous
        );
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::Basic {
            username: "prn".into(),
            password: "secret".into(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[tokio::test]
    async fn basic_auth_checks_both_fields() {
        let auth = BasicAuth::new("prn", "api");
        let ok = auth
            .authenticate(&Credentials::Basic {
                username: "prn".into(),
                password: "api".into(),
            })
            .await
            .unwrap();
        assert_eq!(ok, Identity::user("prn"));

        for (username, password) in [("prn", "nope"), ("other", "api"), ("", "")] {
            let result = auth
                .authenticate(&Credentials::Basic {
                    username: username.into(),
                    password: password.into(),
                })
                .await;
            assert!(matches!(result, Err(ServerError::Unauthorized)));
        }
        assert!(matches!(
            auth.authenticate(&Credentials::Anonymous).await,
            Err(ServerError::Unauthorized)
        ));
    }
}
