use uuid::Uuid;

use super::Claims;
use crate::domain::{Identity, UserProfile};

impl TryFrom<&Claims> for Identity {
    type Error = &'static str;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        let user = &claims.user;
        let id = Uuid::parse_str(&user.id).map_err(|_| "Invalid user ID in token")?;

        Ok(Identity::new(UserProfile {
            id,
            role: user.user_type,
            username: user.username.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
            contact: user.contact.clone(),
        }))
    }
}
