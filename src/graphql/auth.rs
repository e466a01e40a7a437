//! Request identity and session tokens
//!
//! [CurrentUser] is the identity attached to every HTTP request by the
//! session middleware and possibly replaced by the API-key fallback. The
//! GraphQL handler copies it into the request data so resolvers can read it
//! through [AuthExt].

use async_graphql::{Context, ErrorExtensions, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::db::UserRecord;

/// How the identity on a request was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMethod {
    Session,
    ApiKey,
}

/// Authenticated principal, available in GraphQL resolvers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub method: AuthMethod,
}

impl AuthUser {
    pub fn from_record(record: &UserRecord, method: AuthMethod) -> Self {
        Self {
            user_id: record.id,
            username: record.username.clone(),
            is_superuser: record.is_superuser,
            method,
        }
    }
}

/// Identity attached to a request. `None` means anonymous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentUser(pub Option<AuthUser>);

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

/// Claims carried by session tokens
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    username: String,
    is_superuser: bool,
    exp: i64,
    iat: i64,
}

/// Sign a session token for `record`, valid for `ttl_seconds`.
pub fn issue_token(record: &UserRecord, secret: &str, ttl_seconds: i64) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: record.id.to_string(),
        username: record.username.clone(),
        is_superuser: record.is_superuser,
        exp: now + ttl_seconds,
        iat: now,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.trim().as_bytes()),
    )?)
}

/// Verify a session token and extract the user it was issued for
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.trim().as_bytes()),
        &validation,
    )
    .map_err(|e| unauthorized(format!("Invalid token: {}", e)))?;

    let user_id = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| unauthorized("Invalid token subject"))?;

    Ok(AuthUser {
        user_id,
        username: token_data.claims.username,
        is_superuser: token_data.claims.is_superuser,
        method: AuthMethod::Session,
    })
}

pub fn unauthorized(message: impl Into<String>) -> async_graphql::Error {
    async_graphql::Error::new(message.into()).extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
}

pub fn forbidden(message: impl Into<String>) -> async_graphql::Error {
    async_graphql::Error::new(message.into()).extend_with(|_, e| e.set("code", "FORBIDDEN"))
}

/// Extension trait to get the request identity from GraphQL context
pub trait AuthExt {
    /// The authenticated user, or an `UNAUTHORIZED` error
    fn auth_user(&self) -> Result<&AuthUser>;

    /// The authenticated user if present
    fn try_auth_user(&self) -> Option<&AuthUser>;

    /// The authenticated user if it is a superuser, `FORBIDDEN` otherwise
    fn superuser(&self) -> Result<&AuthUser> {
        let user = self.auth_user()?;
        if user.is_superuser {
            Ok(user)
        } else {
            Err(forbidden("Superuser required"))
        }
    }
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.try_auth_user()
            .ok_or_else(|| unauthorized("Authentication required"))
    }

    fn try_auth_user(&self) -> Option<&AuthUser> {
        self.data_opt::<CurrentUser>().and_then(CurrentUser::user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record() -> UserRecord {
        UserRecord {
            id: 7,
            username: "admin".to_string(),
            email: None,
            is_superuser: true,
            is_active: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token(&record(), "s3cret", 60).unwrap();
        let user = verify_token(&token, "s3cret").unwrap();

        assert_eq!(user.user_id, 7);
        assert_eq!(user.username, "admin");
        assert!(user.is_superuser);
        assert_eq!(user.method, AuthMethod::Session);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&record(), "s3cret", 60).unwrap();
        assert_matches!(verify_token(&token, "other"), Err(_));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&record(), "s3cret", -3600).unwrap();
        assert_matches!(verify_token(&token, "s3cret"), Err(_));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_matches!(verify_token("not-a-jwt", "s3cret"), Err(_));
    }

    #[test]
    fn test_current_user() {
        assert!(!CurrentUser::anonymous().is_authenticated());

        let current = CurrentUser(Some(AuthUser::from_record(&record(), AuthMethod::ApiKey)));
        assert!(current.is_authenticated());
        assert_eq!(current.user().map(|u| u.method), Some(AuthMethod::ApiKey));
    }
}
