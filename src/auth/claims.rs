use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// JWT claims issued by the marketplace auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// User section of the token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUser {
    /// User ID
    pub id: String,

    pub user_type: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Bidder company name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Bidder contact number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}
