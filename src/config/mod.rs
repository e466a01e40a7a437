//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Environment variable holding the shared secret for the API-key fallback.
pub const GRAPHQL_API_KEY_VAR: &str = "GRAPHQL_API_KEY";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (for generating URLs)
    pub host: Option<String>,

    /// Server port
    pub port: u16,

    /// SQLite database URL (`sqlite://path` or `sqlite::memory:`)
    pub database_url: String,

    /// Shared secret matched against the `Authorization` header suffix.
    /// `None` when unset or empty.
    pub graphql_api_key: Option<String>,

    /// Secret used to sign and verify session tokens
    pub jwt_secret: String,

    /// Lifetime of issued session tokens
    pub session_ttl_seconds: i64,

    /// Print executed SQL after every GraphQL request
    pub query_log: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_PATH")
            .map(|path| format!("sqlite://{}", path))
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "sqlite://superapp.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            // Development fallback; sessions do not survive a restart
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            std::time::SystemTime::now().hash(&mut hasher);
            format!("dev-secret-{}", hasher.finish())
        });

        Ok(Self {
            host: env::var("HOST").ok(),

            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            graphql_api_key: api_key_from_env(),

            jwt_secret,

            session_ttl_seconds: env::var("SESSION_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid SESSION_TTL_SECONDS")?,

            query_log: env::var("GRAPHQL_QUERY_LOG")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

/// Read `GRAPHQL_API_KEY`, treating an empty value as unset.
pub fn api_key_from_env() -> Option<String> {
    env::var(GRAPHQL_API_KEY_VAR).ok().filter(|k| !k.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" ON "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
