//! HTTP routes for `/graphql`.
//!
//! `POST` executes operations; `GET` serves GraphiQL to browsers and executes
//! query-string operations for everyone else. The identity resolved by the
//! auth middleware and the request's [QueryLog] are passed to the schema with
//! every request.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Extension;
use axum::Router;
use axum::extract::{FromRequest, Request, State};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;

use crate::app::AppState;
use crate::db::QueryLog;
use crate::middleware::GRAPHQL_PATH;

use super::CurrentUser;

/// Router with the GraphQL endpoint. Merge into the app and apply state.
pub fn router() -> Router<AppState> {
    Router::new().route(GRAPHQL_PATH, get(graphql_get).post(graphql_post))
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}

pub fn graphiql_page() -> String {
    GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()
}

async fn graphql_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Extension(log): Extension<QueryLog>,
    request: Request,
) -> Response {
    if accepts_html(request.headers()) {
        return Html(graphiql_page()).into_response();
    }

    match <GraphQLRequest>::from_request(request, &state).await {
        Ok(req) => GraphQLResponse::from(
            state
                .schema
                .execute_logged(req.into_inner(), current, log)
                .await,
        )
        .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

async fn graphql_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Extension(log): Extension<QueryLog>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    if let Some(user) = current.user() {
        tracing::debug!(user_id = user.user_id, method = ?user.method, "GraphQL request");
    }
    state
        .schema
        .execute_logged(req.into_inner(), current, log)
        .await
        .into()
}
