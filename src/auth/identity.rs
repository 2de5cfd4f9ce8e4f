//! Identity provider: turns a bearer credential into a caller identity.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::Claims;
use crate::domain::Identity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Token is not valid: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    InvalidClaims(&'static str),
}

/// Resolves a credential to the caller's identity
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<Identity, IdentityError>;
}

/// Verifies HS256 tokens signed with a shared secret
pub struct JwtIdentityProvider {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, credential: &str) -> Result<Identity, IdentityError> {
        let claims = decode::<Claims>(credential, &self.key, &self.validation)?.claims;
        let identity = Identity::try_from(&claims).map_err(IdentityError::InvalidClaims)?;

        tracing::debug!(
            user_id = %identity.user_id,
            role = %identity.role,
            expires_at = claims.exp,
            "Token verified"
        );
        Ok(identity)
    }
}

#[cfg(test)]
pub(crate) fn sign_test_token(secret: &str, profile: &crate::domain::UserProfile) -> String {
    use super::claims::TokenUser;
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        user: TokenUser {
            id: profile.id.to_string(),
            user_type: profile.role,
            username: profile.username.clone(),
            email: profile.email.clone(),
            company: profile.company.clone(),
            contact: profile.contact.clone(),
        },
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token encodes")
}
