use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::documents::validate_uploads;
use super::validate_amount;
use super::{
    DocumentRef, DocumentUpload, TenderSummary, UnknownVariant, UserProfile, ValidationError,
};

/// Bid status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Whether this bid won its tender
    pub fn is_winning(&self) -> bool {
        matches!(self, Self::Accepted | Self::Completed)
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BidStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownVariant {
                kind: "bid status",
                value: other.to_string(),
            }),
        }
    }
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub bidder_id: Uuid,
    pub bid_amount: Decimal,
    pub documents: Vec<DocumentRef>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for submitting a bid
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBidRequest {
    pub bid_amount: Decimal,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

impl SubmitBidRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount("Bid amount", self.bid_amount)?;
        validate_uploads(&self.documents)
    }
}

/// Validated bid handed to the store
#[derive(Debug, Clone)]
pub struct NewBid {
    pub tender_id: Uuid,
    pub bidder: UserProfile,
    pub bid_amount: Decimal,
    pub documents: Vec<DocumentRef>,
}

/// Request DTO for accepting a bid; the tender id is checked against the bid
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptBidRequest {
    pub tender_id: Uuid,
}

/// Exact-match filters for a bidder's own bids
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BidFilter {
    #[serde(default)]
    pub tender_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<BidStatus>,
}

impl BidFilter {
    pub fn matches(&self, bid: &Bid) -> bool {
        self.tender_id.map_or(true, |id| bid.tender_id == id)
            && self.status.map_or(true, |status| bid.status == status)
    }
}

/// Bid with its bidder and tender display fields resolved
#[derive(Debug, Clone, Serialize)]
pub struct BidListing {
    #[serde(flatten)]
    pub bid: Bid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder: Option<UserProfile>,
    pub tender: TenderSummary,
}

/// Result of a committed award
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Award {
    pub tender_id: Uuid,
    pub bid_id: Uuid,
    pub rejected_bids: u64,
}

/// Result of a committed bid completion
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Completion {
    pub bid_id: Uuid,
    pub tender_id: Uuid,
    /// False when the tender was not `awarded` and kept its status
    pub tender_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amount_is_rejected() {
        let req = SubmitBidRequest {
            bid_amount: Decimal::new(-1, 2),
            documents: vec![],
        };
        assert_eq!(
            req.validate(),
            Err(ValidationError::new("Bid amount cannot be negative"))
        );
    }

    #[test]
    fn amount_must_fit_two_decimal_money_column() {
        let too_large = SubmitBidRequest {
            bid_amount: Decimal::from(1_000_000_000_000i64),
            documents: vec![],
        };
        let sub_cent = SubmitBidRequest {
            bid_amount: Decimal::new(5, 3),
            documents: vec![],
        };
        let largest = SubmitBidRequest {
            bid_amount: Decimal::new(99_999_999_999_999, 2),
            documents: vec![],
        };

        assert!(too_large.validate().is_err());
        assert_eq!(
            sub_cent.validate(),
            Err(ValidationError::new(
                "Bid amount must have at most 2 decimal places"
            ))
        );
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn zero_amount_is_allowed() {
        let req = SubmitBidRequest {
            bid_amount: Decimal::ZERO,
            documents: vec![],
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_document_name_is_rejected() {
        let req = SubmitBidRequest {
            bid_amount: Decimal::from(10),
            documents: vec![DocumentUpload {
                file_name: " ".to_string(),
                file_url: None,
            }],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn filter_matches_on_every_present_field() {
        let tender_id = Uuid::new_v4();
        let bid = Bid {
            id: Uuid::new_v4(),
            tender_id,
            bidder_id: Uuid::new_v4(),
            bid_amount: Decimal::from(100),
            documents: vec![],
            status: BidStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(BidFilter::default().matches(&bid));
        assert!(BidFilter {
            tender_id: Some(tender_id),
            status: Some(BidStatus::Pending),
        }
        .matches(&bid));
        assert!(!BidFilter {
            tender_id: Some(tender_id),
            status: Some(BidStatus::Completed),
        }
        .matches(&bid));
        assert!(!BidFilter {
            tender_id: Some(Uuid::new_v4()),
            status: None,
        }
        .matches(&bid));
    }

    #[test]
    fn winning_statuses() {
        assert!(BidStatus::Accepted.is_winning());
        assert!(BidStatus::Completed.is_winning());
        assert!(!BidStatus::Pending.is_winning());
        assert!(!BidStatus::Rejected.is_winning());
    }
}
