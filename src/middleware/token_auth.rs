//! API-key fallback for the GraphQL endpoint
//!
//! Requests to [GRAPHQL_PATH] that carry no valid session may authenticate
//! with the shared `GRAPHQL_API_KEY` secret. Any `Authorization` value that
//! ends with the secret is accepted (so `Bearer <secret>` works) and the
//! request then acts as the first superuser. Without a configured secret
//! every unauthenticated request to the endpoint is rejected with 401.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use crate::db::{Database, QueryLog};
use crate::graphql::{AuthMethod, AuthUser, CurrentUser};

/// Path the fallback applies to
pub const GRAPHQL_PATH: &str = "/graphql";

/// Error returned when the secret is not configured
pub const MISSING_KEY_ERROR: &str = "Invalid Authorization token. GRAPHQL_API_KEY is missing.";

#[derive(Clone)]
pub struct TokenAuth {
    api_key: Option<Arc<str>>,
    db: Database,
}

impl TokenAuth {
    /// An empty key counts as unset.
    pub fn new(api_key: Option<String>, db: Database) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
            db,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Suffix match of the `Authorization` value against the secret
    pub fn header_matches(&self, header: Option<&str>) -> bool {
        match (&self.api_key, header) {
            (Some(key), Some(value)) => value.ends_with(key.as_ref()),
            _ => false,
        }
    }

    /// Identity granted by a matching key: the first superuser, or anonymous
    /// when there is none. The lookup is recorded into `log` when given.
    async fn superuser_identity(&self, log: Option<QueryLog>) -> CurrentUser {
        let db = match log {
            Some(log) => self.db.scoped(log),
            None => self.db.clone(),
        };
        match db.users().first_superuser().await {
            Ok(Some(record)) => {
                info!(user_id = record.id, "API key accepted, acting as superuser");
                CurrentUser(Some(AuthUser::from_record(&record, AuthMethod::ApiKey)))
            }
            Ok(None) => {
                warn!("API key accepted but no superuser exists");
                CurrentUser::anonymous()
            }
            Err(e) => {
                warn!(error = %e, "Superuser lookup failed");
                CurrentUser::anonymous()
            }
        }
    }
}

fn missing_key_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": MISSING_KEY_ERROR })),
    )
        .into_response()
}

pub async fn token_auth_middleware(
    State(auth): State<TokenAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != GRAPHQL_PATH {
        return next.run(request).await;
    }

    let authenticated = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(CurrentUser::is_authenticated);

    if !authenticated {
        if !auth.is_configured() {
            debug!("Rejecting unauthenticated GraphQL request: API key not configured");
            return missing_key_response();
        }

        let header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let current = if auth.header_matches(header) {
            let log = request.extensions().get::<QueryLog>().cloned();
            auth.superuser_identity(log).await
        } else {
            CurrentUser::anonymous()
        };
        request.extensions_mut().insert(current);
    }

    next.run(request).await
}
