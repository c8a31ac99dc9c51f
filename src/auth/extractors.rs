use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::claims::TokenKind;
use super::jwt::JwtKeys;
use super::repo::{Role, User};
use crate::{error::ApiError, state::AppState};

/// Request-scoped identity resolved by the auth gate. The role comes from
/// the live user row, not from the token claims.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

/// Extracts the bearer token, validates it, and re-checks the user against
/// the store. A deleted or since-unverified user is rejected even while the
/// token itself is still within its lifetime.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("No token provided."))?;

        let token =
            bearer_token(header).ok_or_else(|| ApiError::unauthorized("No token provided."))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::unauthorized("Invalid token.")
        })?;
        if claims.kind != TokenKind::Access {
            return Err(ApiError::unauthorized("Invalid token."));
        }

        match User::find_by_id(&state.db, claims.sub).await? {
            Some(user) if user.verified => Ok(AuthUser(Identity {
                id: user.id,
                role: user.role,
            })),
            _ => {
                warn!(user_id = %claims.sub, "token for missing or unverified user");
                Err(ApiError::unauthorized("User not found or not verified."))
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Role gate: pass through unchanged when the identity's role is allowed.
pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&identity.role) {
        return Ok(());
    }
    let wanted = allowed
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(ApiError::Forbidden(format!(
        "Access denied. Requires {wanted} role."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parses_scheme() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn role_gate_allows_listed_roles() {
        let tutor = Identity {
            id: Uuid::new_v4(),
            role: Role::Tutor,
        };
        assert!(require_role(&tutor, &[Role::Tutor, Role::Admin]).is_ok());
    }

    #[test]
    fn role_gate_rejects_unlisted_roles() {
        let student = Identity {
            id: Uuid::new_v4(),
            role: Role::Student,
        };
        let err = require_role(&student, &[Role::Tutor, Role::Admin]).unwrap_err();
        match err {
            ApiError::Forbidden(msg) => {
                assert!(msg.contains("tutor or admin"));
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }
}
