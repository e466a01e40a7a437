//! HTTP middleware: request query logs, session authentication and the
//! GraphQL API-key fallback

pub mod query_log;
pub mod session;
pub mod token_auth;

pub use query_log::query_log_middleware;
pub use session::{SESSION_COOKIE, SessionAuth, session_middleware};
pub use token_auth::{GRAPHQL_PATH, MISSING_KEY_ERROR, TokenAuth, token_auth_middleware};
