//! Application state and HTTP router construction.
//!
//! Used by [main] and by the integration tests to build the Axum app.

use std::sync::Arc;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::Config;
use crate::db::Database;
use crate::graphql::{self, CombinedSchema};
use crate::middleware::{
    SessionAuth, TokenAuth, query_log_middleware, session_middleware, token_auth_middleware,
};

/// Shared state for HTTP handlers (GraphQL, health routes).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub schema: CombinedSchema,
}

/// Build the full Axum router: health routes, /graphql and the auth layers.
/// Returns Router<()> (state fully applied) for use with axum::serve.
///
/// The session layer runs before the API-key fallback so a valid session is
/// never replaced by the superuser identity. Both run after the request's
/// query log is opened.
pub fn build_app(state: AppState) -> Router<()> {
    let session = SessionAuth::new(state.config.jwt_secret.clone());
    let token = TokenAuth::new(state.config.graphql_api_key.clone(), state.db.clone());

    Router::new()
        .merge(api::health::router())
        .merge(graphql::service::router())
        .layer(from_fn_with_state(token, token_auth_middleware))
        .layer(from_fn_with_state(session, session_middleware))
        .layer(from_fn(query_log_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
