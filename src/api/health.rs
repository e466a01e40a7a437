//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize)]
struct Liveness {
    alive: bool,
    version: &'static str,
}

/// Readiness report; `schema` counts the root fields served at /graphql
#[derive(Serialize)]
struct Readiness {
    database: bool,
    schema: SchemaSize,
}

#[derive(Serialize)]
struct SchemaSize {
    queries: usize,
    mutations: usize,
}

async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        alive: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 503 until the database answers
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let database = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.db.pool())
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Readiness probe failed"))
        .is_ok();

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let report = Readiness {
        database,
        schema: SchemaSize {
            queries: state.schema.query_fields().len(),
            mutations: state.schema.mutation_fields().len(),
        },
    };
    (status, Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(liveness))
        .route("/readyz", get(readiness))
}
