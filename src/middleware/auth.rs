use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use roster_auth::Subject;
use roster_core::AppError;
use roster_models::UserId;

use crate::state::AppState;

/// Extractor that resolves the bearer token into the acting [`Subject`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Subject);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.user_id)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.0.has_scope(scope)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::unauthenticated(
                    "either no token was passed or the provided token was malformed",
                )
            })?;

        let subject = state.identity.resolve_subject(token).await?;

        Ok(AuthUser(subject))
    }
}

/// Generates an extractor that authenticates the caller and requires `$scope`
/// on their token.
#[macro_export]
macro_rules! require_scope {
    ($name:ident, $scope:path) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = roster_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.has_scope($scope) {
                    tracing::debug!(scope = $scope, "missing required scope");
                    return Err(roster_core::AppError::forbidden(format!(
                        "token is missing required scope: {}",
                        $scope
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_scope!(RequireClassesGet, roster_core::scopes::CLASSES_GET);
require_scope!(RequireClassesList, roster_core::scopes::CLASSES_LIST);
require_scope!(RequireClassesNew, roster_core::scopes::CLASSES_NEW);
require_scope!(RequireClassesUpdate, roster_core::scopes::CLASSES_UPDATE);
require_scope!(RequireClassesDelete, roster_core::scopes::CLASSES_DELETE);
require_scope!(RequireClassesListMembers, roster_core::scopes::CLASSES_LIST_MEMBERS);
require_scope!(RequireClassesJoin, roster_core::scopes::CLASSES_JOIN);
require_scope!(RequireClassesLeave, roster_core::scopes::CLASSES_LEAVE);
require_scope!(RequireClassesMembersUpdate, roster_core::scopes::CLASSES_MEMBERS_UPDATE);

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn auth_user(scopes: &[&str]) -> AuthUser {
        AuthUser(Subject {
            user_id: Uuid::new_v4(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_has_scope() {
        let user = auth_user(&["classes.get", "classes.join"]);
        assert!(user.has_scope("classes.get"));
        assert!(!user.has_scope("classes.delete"));
    }

    #[test]
    fn test_scopes_match_exactly() {
        let user = auth_user(&["classes.members:update"]);
        assert!(user.has_scope("classes.members:update"));
        assert!(!user.has_scope("classes.members"));
    }

    #[test]
    fn test_user_id_wraps_subject() {
        let user = auth_user(&[]);
        assert_eq!(user.user_id().into_inner(), user.0.user_id);
    }
}
