//! Tender and bid persistence.
//!
//! The store is the only shared mutable resource of the service. Every
//! method that changes more than one record applies all of its writes or
//! none of them; conditional transitions report the state they found
//! instead of failing, so the procurement manager decides what that means
//! for the caller.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Bid, BidFilter, BidListing, BidStatus, NewBid, NewTender, Tender, TenderListing,
    TenderStatus, UnknownVariant,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] UnknownVariant),
}

/// Outcome of inserting a bid
#[derive(Debug, Clone, PartialEq)]
pub enum BidInsert {
    Created(Bid),
    TenderMissing,
    TenderNotOpen(TenderStatus),
    /// The bidder already has a bid on this tender
    Duplicate,
}

/// Outcome of awarding a tender to one of its bids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardOutcome {
    Awarded { rejected: u64 },
    TenderMissing,
    TenderNotOpen(TenderStatus),
    /// The bid does not exist or belongs to another tender
    BidNotOnTender,
}

/// Outcome of completing an accepted bid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed { tender_id: Uuid, tender_completed: bool },
    BidMissing,
    NotOwner,
    BidNotAccepted(BidStatus),
}

#[async_trait]
pub trait ProcurementStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Insert an open tender and record its creator's profile.
    async fn insert_tender(&self, tender: NewTender) -> Result<Tender, StoreError>;

    /// All tenders, newest first.
    async fn list_tenders(&self) -> Result<Vec<TenderListing>, StoreError>;

    async fn find_tender(&self, id: Uuid) -> Result<Option<TenderListing>, StoreError>;

    /// Tenders published by `user_id`, newest first.
    async fn tenders_created_by(&self, user_id: Uuid) -> Result<Vec<Tender>, StoreError>;

    async fn find_bid(&self, id: Uuid) -> Result<Option<Bid>, StoreError>;

    /// Insert a pending bid if its tender is open and the bidder has no bid
    /// on it yet. The open check and the insert are one atomic step.
    async fn insert_bid(&self, bid: NewBid) -> Result<BidInsert, StoreError>;

    /// Move the tender from open to awarded, accept `bid_id` and reject every
    /// other bid on the tender, atomically. A tender that is no longer open
    /// leaves everything untouched.
    async fn award_bid(&self, tender_id: Uuid, bid_id: Uuid) -> Result<AwardOutcome, StoreError>;

    /// Complete an accepted bid owned by `bidder_id`, and complete its tender
    /// in the same step if the tender is currently awarded.
    async fn complete_bid(
        &self,
        bid_id: Uuid,
        bidder_id: Uuid,
    ) -> Result<CompletionOutcome, StoreError>;

    /// Bids on a tender, cheapest first, then by submission time.
    async fn bids_for_tender(&self, tender_id: Uuid) -> Result<Vec<BidListing>, StoreError>;

    /// Bids submitted by `bidder_id`, newest first.
    async fn bids_by_bidder(
        &self,
        bidder_id: Uuid,
        filter: &BidFilter,
    ) -> Result<Vec<BidListing>, StoreError>;

    /// Bids on every tender published by `user_id`, newest first.
    async fn bids_on_tenders_created_by(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BidListing>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
