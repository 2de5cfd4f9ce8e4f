use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

/// Marketplace role carried by the identity token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Bidder,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Bidder => "bidder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "bidder" => Ok(Self::Bidder),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Display fields of a user, resolved on tender and bid listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

#[cfg(test)]
impl UserProfile {
    /// Profile with no display fields
    pub fn bare(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            username: None,
            email: None,
            company: None,
            contact: None,
        }
    }
}

/// Resolved caller of a lifecycle operation.
///
/// Produced by the identity provider and passed explicitly into every
/// operation of the procurement manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub profile: UserProfile,
}

impl Identity {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            user_id: profile.id,
            role: profile.role,
            profile,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
