//! Session authentication
//!
//! Runs on every request. Verifies the session token carried in the
//! `session` cookie or as `Authorization: Bearer <token>` and attaches the
//! resulting [CurrentUser] (anonymous when neither verifies) to the request
//! extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::graphql::{CurrentUser, verify_token};

/// Name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct SessionAuth {
    secret: Arc<str>,
}

impl SessionAuth {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
        }
    }

    /// Resolve the session identity from request headers
    pub fn authenticate(&self, headers: &HeaderMap) -> CurrentUser {
        let cookie = CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());

        for token in cookie.into_iter().chain(bearer) {
            match verify_token(&token, &self.secret) {
                Ok(user) => {
                    tracing::debug!(user_id = user.user_id, "Session authenticated");
                    return CurrentUser(Some(user));
                }
                Err(e) => {
                    tracing::debug!(error = %e.message, "Session token rejected");
                }
            }
        }

        CurrentUser::anonymous()
    }
}

pub async fn session_middleware(
    State(auth): State<SessionAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let current = auth.authenticate(request.headers());
    request.extensions_mut().insert(current);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use crate::db::UserRecord;
    use crate::graphql::issue_token;

    const SECRET: &str = "session-secret";

    fn token() -> String {
        let record = UserRecord {
            id: 3,
            username: "dana".to_string(),
            email: None,
            is_superuser: false,
            is_active: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        issue_token(&record, SECRET, 60).unwrap()
    }

    #[test]
    fn test_cookie_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session={}", token())).unwrap(),
        );

        let current = SessionAuth::new(SECRET).authenticate(&headers);
        assert_eq!(current.user().map(|u| u.user_id), Some(3));
    }

    #[test]
    fn test_bearer_session() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token())).unwrap(),
        );

        assert!(SessionAuth::new(SECRET).authenticate(&headers).is_authenticated());
    }

    #[test]
    fn test_api_key_is_not_a_session() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret123"));

        assert!(!SessionAuth::new(SECRET).authenticate(&headers).is_authenticated());
    }

    #[test]
    fn test_no_credentials() {
        assert!(!SessionAuth::new(SECRET).authenticate(&HeaderMap::new()).is_authenticated());
    }
}
