use serde::Serialize;

use super::{BidListing, Tender, UserProfile};

/// Activity overview for the authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminActivity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder: Option<BidderActivity>,
}

/// Tenders an administrator published and the bids they drew
#[derive(Debug, Clone, Serialize)]
pub struct AdminActivity {
    pub created_tenders: Vec<Tender>,
    pub bids_on_my_tenders: Vec<BidListing>,
    pub accepted_bids: Vec<BidListing>,
}

/// A bidder's submissions, split by where they stand
#[derive(Debug, Clone, Serialize)]
pub struct BidderActivity {
    pub all_submitted_bids: Vec<BidListing>,
    pub accepted_bids: Vec<BidListing>,
    /// Pending bids on tenders that are still open
    pub ongoing_bids: Vec<BidListing>,
    pub completed_bids: Vec<BidListing>,
}
