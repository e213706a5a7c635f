//! Subject identity resolution.
//!
//! The HTTP layer hands the raw bearer token to an [`IdentityResolver`] and
//! gets back a [`Subject`]: the verified user id plus the scopes the token was
//! granted. Swapping the resolver (for an introspection endpoint, say) leaves
//! the services untouched.

use async_trait::async_trait;
use uuid::Uuid;

use roster_config::JwtConfig;
use roster_core::AppError;

use crate::jwt::verify_token;

/// The verified identity acting on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: Uuid,
    pub scopes: Vec<String>,
}

impl Subject {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves a bearer token into the subject it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthenticated`] when the token cannot be verified.
    async fn resolve_subject(&self, token: &str) -> Result<Subject, AppError>;
}

/// Resolves subjects from locally verified HS256 access tokens.
#[derive(Debug, Clone)]
pub struct JwtIdentityResolver {
    config: JwtConfig,
}

impl JwtIdentityResolver {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve_subject(&self, token: &str) -> Result<Subject, AppError> {
        let claims = verify_token(token, &self.config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthenticated("token subject is not a valid user id"))?;

        Ok(Subject {
            user_id,
            scopes: claims.scopes,
        })
    }
}
