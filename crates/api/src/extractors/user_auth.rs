//! Authenticated-user extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::{bearer_token, AuthContext};

/// The caller of a protected route.
///
/// Uses the context left by `require_user_auth` when present and otherwise
/// validates the bearer token itself.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub jti: String,
}

impl From<AuthContext> for UserAuth {
    fn from(context: AuthContext) -> Self {
        Self {
            user_id: context.user_id,
            jti: context.jti,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(context.clone().into());
        }

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = bearer_token(header_value)?;
        Ok(AuthContext::from_token(&state.jwt, token)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_context() {
        let context = AuthContext {
            user_id: Uuid::new_v4(),
            jti: "jti-1".to_string(),
        };
        let auth: UserAuth = context.clone().into();
        assert_eq!(auth.user_id, context.user_id);
        assert_eq!(auth.jti, "jti-1");
    }
}
