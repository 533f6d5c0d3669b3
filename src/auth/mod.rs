//! JWT authentication with role-based access control
//!
//! Stateless HS256 tokens keyed by a server secret; bcrypt password
//! hashing; roles `user` and `admin`. Independent of the retrieval core
//! beyond gating HTTP access.

pub mod jwt;
pub mod routes;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::storage::UserRecord;

/// Extractor for an authenticated user: validates the bearer token and
/// loads the account.
pub struct AuthUser(pub UserRecord);

/// Extractor for an authenticated admin; rejects non-admin tokens.
pub struct AdminUser(pub UserRecord);

fn bearer_token(parts: &Parts) -> Result<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Auth("Could not validate credentials".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let user_id = jwt::verify_token(token, &state.config().auth.jwt_secret)?;
        let user = state
            .db()
            .find_user_by_id(&user_id)?
            .ok_or_else(|| Error::Auth("Could not validate credentials".to_string()))?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != "admin" {
            return Err(Error::Permission);
        }
        Ok(AdminUser(user))
    }
}
