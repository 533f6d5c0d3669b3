//! Auth HTTP handlers: signup, login, me, admin-only

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::storage::{MetadataDb, UserRecord};

use super::jwt;
use super::{AdminUser, AuthUser};

const ROLES: &[&str] = &["user", "admin"];

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.starts_with('@') || trimmed.ends_with('@') {
        return Err(Error::validation(format!("Invalid email address: {email}")));
    }
    Ok(())
}

fn issue_for(user: &UserRecord, auth: &AuthConfig) -> Result<TokenResponse> {
    let access_token = jwt::issue_token(&user.id, &auth.jwt_secret, auth.token_expiry_minutes)?;
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: user.into(),
    })
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<TokenResponse>> {
    validate_email(&request.email)?;
    if !ROLES.contains(&request.role.as_str()) {
        return Err(Error::validation("Invalid role. Must be 'user' or 'admin'"));
    }
    if state.db().find_user_by_email(&request.email)?.is_some() {
        return Err(Error::validation("Email already registered"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::internal(format!("Password hashing failed: {e}")))?;

    let user = UserRecord {
        id: Uuid::new_v4(),
        email: request.email.trim().to_string(),
        password_hash,
        role: request.role,
        created_at: Utc::now(),
    };
    state.db().insert_user(&user)?;
    tracing::info!("New {} account: {}", user.role, user.email);

    Ok(Json(issue_for(&user, &state.config().auth)?))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let user = state
        .db()
        .find_user_by_email(request.email.trim())?
        .ok_or_else(|| Error::Auth("Incorrect email or password".to_string()))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| Error::internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(Error::Auth("Incorrect email or password".to_string()));
    }

    Ok(Json(issue_for(&user, &state.config().auth)?))
}

/// GET /auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// GET /auth/admin-only
pub async fn admin_only(AdminUser(user): AdminUser) -> Json<Value> {
    Json(json!({
        "message": "This is an admin-only endpoint",
        "user": user.email,
    }))
}

/// Provision the default admin account at startup when configured and
/// absent.
pub fn provision_default_admin(db: &MetadataDb, auth: &AuthConfig) -> Result<()> {
    let (Some(email), Some(password)) = (
        auth.default_admin_email.as_deref(),
        auth.default_admin_password.as_deref(),
    ) else {
        tracing::info!("No default admin configured, skipping provisioning");
        return Ok(());
    };

    if db.find_user_by_email(email)?.is_some() {
        tracing::info!("Admin user already exists: {email}");
        return Ok(());
    }

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::internal(format!("Password hashing failed: {e}")))?;
    db.insert_user(&UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash,
        role: "admin".to_string(),
        created_at: Utc::now(),
    })?;
    tracing::info!("Default admin user created: {email}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("nodomain").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
    }

    #[test]
    fn default_admin_provisioning_is_idempotent() {
        let db = MetadataDb::in_memory().unwrap();
        let auth = AuthConfig {
            default_admin_email: Some("admin@example.com".to_string()),
            default_admin_password: Some("s3cret".to_string()),
            ..AuthConfig::default()
        };

        provision_default_admin(&db, &auth).unwrap();
        provision_default_admin(&db, &auth).unwrap();

        let admin = db.find_user_by_email("admin@example.com").unwrap().unwrap();
        assert_eq!(admin.role, "admin");
        assert!(bcrypt::verify("s3cret", &admin.password_hash).unwrap());
    }

    #[test]
    fn provisioning_skips_when_unconfigured() {
        let db = MetadataDb::in_memory().unwrap();
        provision_default_admin(&db, &AuthConfig::default()).unwrap();
        assert!(db.find_user_by_email("admin@example.com").unwrap().is_none());
    }
}
