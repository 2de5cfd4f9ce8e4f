use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::domain::Identity;
use crate::error::ApiError;

/// Legacy credential header still sent by older clients
pub const X_AUTH_TOKEN: &str = "x-auth-token";

/// Extractor that requires authentication
/// Use this in route handlers to require a valid token
///
/// Example:
/// ```ignore
/// async fn protected_route(auth: RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

impl std::ops::Deref for RequireAuth {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = match err {
            AuthError::MissingToken => "No token, authorization denied",
            AuthError::InvalidFormat => "Invalid authorization format",
            AuthError::InvalidToken => "Token is not valid",
        };
        ApiError::Unauthorized(message.to_string())
    }
}

/// Pull the bearer credential from `Authorization`, falling back to `x-auth-token`
async fn credential(parts: &mut Parts, state: &Arc<AppState>) -> Result<String, AuthError> {
    match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
        Ok(TypedHeader(Authorization(bearer))) => Ok(bearer.token().to_string()),
        Err(rejection) if rejection.is_missing() => {
            let token = parts
                .headers
                .get(X_AUTH_TOKEN)
                .ok_or(AuthError::MissingToken)?
                .to_str()
                .map_err(|_| AuthError::InvalidFormat)?;
            Ok(token.to_string())
        }
        Err(_) => Err(AuthError::InvalidFormat),
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = credential(parts, state).await?;
        if token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }

        let identity = state.identity.authenticate(&token).await.map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            AuthError::InvalidToken
        })?;

        Ok(RequireAuth(identity))
    }
}
