//! GraphQL integration layer
//!
//! Merges the GraphQL fragments of every registered application into one
//! schema at `/graphql`, authenticating requests by session or, as a
//! fallback, by the shared `GRAPHQL_API_KEY` secret.

pub mod api;
pub mod app;
pub mod apps;
pub mod cli;
pub mod config;
pub mod db;
pub mod graphql;
pub mod middleware;

pub use app::{AppState, build_app};
