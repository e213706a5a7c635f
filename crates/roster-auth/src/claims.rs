//! JWT claim structure for access tokens.

use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
///
/// # Fields
///
/// - `sub`: Subject (user) ID
/// - `scopes`: OAuth scopes granted to the token
/// - `exp`: Token expiration timestamp
/// - `iat`: Token issued-at timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// Scopes granted to the client
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            scopes: vec!["classes.get".to_string()],
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""scopes":["classes.get"]"#));
    }

    #[test]
    fn test_claims_without_scopes_deserialize() {
        let json = r#"{"sub":"user-id-456","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-id-456");
        assert!(claims.scopes.is_empty());
        assert_eq!(claims.exp, 9999999999);
    }
}
