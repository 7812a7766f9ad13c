//! `AuthUser` extractor, reading the claims `require_auth` stored in the request.

use crate::api::handlers::AppError;
use crate::auth::jwt::Claims;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl AuthUser {
    fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
        Ok(Self {
            user_id,
            email: claims.email.clone(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::Unauthorized("Authentication required".to_string())
        })?;
        Self::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_valid_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            email: "ana@example.com".to_string(),
            iat: 0,
            exp: 0,
        };
        let user = AuthUser::from_claims(&claims).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "ana@example.com");
    }

    #[test]
    fn test_invalid_sub_rejected() {
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: "x@example.com".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(
            AuthUser::from_claims(&claims),
            Err(AppError::Unauthorized(_))
        ));
    }
}
