//! Opens the per-request [QueryLog] for the GraphQL endpoint.
//!
//! The log is attached to the request extensions before authentication runs,
//! so the API-key superuser lookup is recorded alongside the statements the
//! operation itself executes.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::db::QueryLog;

use super::GRAPHQL_PATH;

pub async fn query_log_middleware(mut request: Request, next: Next) -> Response {
    if request.uri().path() == GRAPHQL_PATH {
        request.extensions_mut().insert(QueryLog::new());
    }
    next.run(request).await
}
