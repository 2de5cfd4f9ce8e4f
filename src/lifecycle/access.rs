//! Capability checks performed once at the start of each lifecycle operation.

use uuid::Uuid;

use super::LifecycleError;
use crate::domain::{Identity, Role};

/// What a caller is attempting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PublishTender,
    SubmitBid,
    ViewOwnBids,
    /// Award a tender or inspect its bids
    ManageTender { creator: Uuid },
    CompleteBid { bidder: Uuid },
}

/// Result of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Forbidden(&'static str),
}

impl Access {
    pub fn require(self) -> Result<(), LifecycleError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden(reason) => Err(LifecycleError::forbidden(reason)),
        }
    }
}

impl Identity {
    pub fn can(&self, capability: Capability) -> Access {
        match capability {
            Capability::PublishTender => match self.role {
                Role::Admin => Access::Allowed,
                Role::Bidder => {
                    Access::Forbidden("Access denied. Only administrators can create tenders.")
                }
            },
            Capability::SubmitBid => match self.role {
                Role::Bidder => Access::Allowed,
                Role::Admin => Access::Forbidden("Access denied. Only bidders can submit bids."),
            },
            Capability::ViewOwnBids => match self.role {
                Role::Bidder => Access::Allowed,
                Role::Admin => {
                    Access::Forbidden("Access denied. Only bidders can view their bids.")
                }
            },
            Capability::ManageTender { creator } => {
                if self.is_admin() || self.user_id == creator {
                    Access::Allowed
                } else {
                    Access::Forbidden(
                        "Access denied. Only an administrator or the tender creator can manage this tender.",
                    )
                }
            }
            Capability::CompleteBid { bidder } => {
                if self.user_id == bidder {
                    Access::Allowed
                } else {
                    Access::Forbidden("Access denied. You can only mark your own bids as complete.")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfile;

    fn identity(role: Role) -> Identity {
        Identity::new(UserProfile::bare(Uuid::new_v4(), role))
    }

    #[test]
    fn only_admins_publish() {
        assert_eq!(identity(Role::Admin).can(Capability::PublishTender), Access::Allowed);
        assert!(matches!(
            identity(Role::Bidder).can(Capability::PublishTender),
            Access::Forbidden(_)
        ));
    }

    #[test]
    fn creator_manages_own_tender_regardless_of_role() {
        let bidder = identity(Role::Bidder);
        assert_eq!(
            bidder.can(Capability::ManageTender {
                creator: bidder.user_id
            }),
            Access::Allowed
        );
        assert!(matches!(
            bidder.can(Capability::ManageTender {
                creator: Uuid::new_v4()
            }),
            Access::Forbidden(_)
        ));
    }

    #[test]
    fn admins_manage_any_tender() {
        assert_eq!(
            identity(Role::Admin).can(Capability::ManageTender {
                creator: Uuid::new_v4()
            }),
            Access::Allowed
        );
    }

    #[test]
    fn admins_cannot_complete_bids_they_do_not_own() {
        assert!(matches!(
            identity(Role::Admin).can(Capability::CompleteBid {
                bidder: Uuid::new_v4()
            }),
            Access::Forbidden(_)
        ));
    }
}
