use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};

/// Payload carried on every authenticated request. The role is baked in
/// at login so route guards never need a user lookup.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    /// Expiry, unix seconds
    pub exp: i64,
    /// Issued at, unix seconds
    pub iat: i64,
}

impl Claims {
    fn new(user_id: Uuid, email: &str, role: UserRole, valid_hours: i64) -> Self {
        let issued = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            role,
            exp: (issued + Duration::hours(valid_hours)).timestamp(),
            iat: issued.timestamp(),
        }
    }
}

/// Sign a token for a freshly registered or logged-in user.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    role: UserRole,
    secret: &str,
    valid_hours: i64,
) -> AppResult<String> {
    let claims = Claims::new(user_id, email, role, valid_hours);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {e}")))
}

/// Check signature and expiry, returning the embedded claims.
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Token rejected: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_back_to_its_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "driver@test.ma", UserRole::Driver, "secret", 24).unwrap();

        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "driver@test.ma");
        assert_eq!(claims.role, UserRole::Driver);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            issue_token(Uuid::new_v4(), "user@test.ma", UserRole::Customer, "secret", 24).unwrap();
        assert!(matches!(
            decode_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
