//! JWT (JSON Web Token) utilities.
//!
//! Tokens are HS256-signed with the secret from [`JwtConfig`]. Verification
//! checks the signature and expiry; anything else is the caller's concern.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use roster_config::JwtConfig;
use roster_core::AppError;

use crate::claims::Claims;

/// Creates an access token for `user_id` carrying `scopes`.
///
/// # Errors
///
/// Returns an error if token encoding fails (e.g., invalid secret key).
pub fn create_access_token(
    user_id: Uuid,
    scopes: Vec<String>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = now + jwt_config.access_token_expiry;

    let claims = Claims {
        sub: user_id.to_string(),
        scopes,
        exp: exp.max(0) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(signing_failure)
}

fn signing_failure(e: jsonwebtoken::errors::Error) -> AppError {
    tracing::error!(error = %e, "failed to create access token");
    AppError::internal(e)
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns [`AppError::Unauthenticated`] if the signature is invalid, the
/// token has expired or it is malformed.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        AppError::unauthenticated("invalid or expired token")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let config = get_test_jwt_config();
        let user_id = Uuid::new_v4();

        let token =
            create_access_token(user_id, vec!["classes.get".to_string()], &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.scopes, vec!["classes.get".to_string()]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_invalid_token() {
        let config = get_test_jwt_config();
        let result = verify_token("invalid-token", &config);
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = get_test_jwt_config();
        let token = create_access_token(Uuid::new_v4(), vec![], &config).unwrap();

        let wrong_config = JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
        };

        assert!(verify_token(&token, &wrong_config).is_err());
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err = signing_failure(jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into());
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.code(), "internal");
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig {
            access_token_expiry: -3600,
            ..get_test_jwt_config()
        };
        let token = create_access_token(Uuid::new_v4(), vec![], &config).unwrap();
        assert!(verify_token(&token, &get_test_jwt_config()).is_err());
    }
}
