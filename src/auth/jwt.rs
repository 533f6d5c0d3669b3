//! HS256 token issuance and verification

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Token claims: subject (user id) and expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Issue a token for a user id.
pub fn issue_token(user_id: &Uuid, secret: &str, expiry_minutes: i64) -> Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::minutes(expiry_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::internal(format!("Token encoding failed: {e}")))
}

/// Verify a token and return the user id it names.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| Error::Auth("Could not validate credentials".to_string()))?;

    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| Error::Auth("Could not validate credentials".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(&user_id, "secret", 30).unwrap();
        assert_eq!(verify_token(&token, "secret").unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&Uuid::new_v4(), "secret", 30).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token("not.a.token", "secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&Uuid::new_v4(), "secret", -5).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }
}
