//! In-memory store.
//!
//! Holds every record behind one mutex; each trait method runs inside a
//! single critical section with no await point, which makes multi-record
//! transitions atomic. Used for local development and tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{AwardOutcome, BidInsert, CompletionOutcome, ProcurementStore, StoreError};
use crate::domain::{
    Bid, BidFilter, BidListing, BidStatus, NewBid, NewTender, Tender, TenderListing,
    TenderStatus, UserProfile,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserProfile>,
    /// Insertion order
    tenders: Vec<Tender>,
    /// Insertion order
    bids: Vec<Bid>,
}

impl MemoryState {
    fn upsert_user(&mut self, profile: &UserProfile) {
        match self.users.get_mut(&profile.id) {
            Some(existing) => {
                existing.role = profile.role;
                if profile.username.is_some() {
                    existing.username = profile.username.clone();
                }
                if profile.email.is_some() {
                    existing.email = profile.email.clone();
                }
                if profile.company.is_some() {
                    existing.company = profile.company.clone();
                }
                if profile.contact.is_some() {
                    existing.contact = profile.contact.clone();
                }
            }
            None => {
                self.users.insert(profile.id, profile.clone());
            }
        }
    }

    fn tender(&self, id: Uuid) -> Option<&Tender> {
        self.tenders.iter().find(|t| t.id == id)
    }

    fn tender_mut(&mut self, id: Uuid) -> Option<&mut Tender> {
        self.tenders.iter_mut().find(|t| t.id == id)
    }

    fn tender_listing(&self, tender: &Tender) -> TenderListing {
        TenderListing {
            tender: tender.clone(),
            creator: self.users.get(&tender.created_by).cloned(),
        }
    }

    fn bid_listing(&self, bid: &Bid) -> Option<BidListing> {
        let tender = self.tender(bid.tender_id)?;
        Some(BidListing {
            bid: bid.clone(),
            bidder: self.users.get(&bid.bidder_id).cloned(),
            tender: tender.summary(),
        })
    }

    /// Newest first
    fn bid_listings<'a>(&self, bids: impl DoubleEndedIterator<Item = &'a Bid>) -> Vec<BidListing> {
        bids.rev().filter_map(|b| self.bid_listing(b)).collect()
    }
}

/// Store keeping all records in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcurementStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_tender(&self, tender: NewTender) -> Result<Tender, StoreError> {
        let now = Utc::now();
        let record = Tender {
            id: Uuid::new_v4(),
            title: tender.title,
            description: tender.description,
            category: tender.category,
            status: TenderStatus::Open,
            start_date: tender.start_date,
            end_date: tender.end_date,
            created_by: tender.creator.id,
            min_budget: tender.min_budget,
            max_budget: tender.max_budget,
            documents: tender.documents,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.lock();
        state.upsert_user(&tender.creator);
        state.tenders.push(record.clone());
        Ok(record)
    }

    async fn list_tenders(&self) -> Result<Vec<TenderListing>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .tenders
            .iter()
            .rev()
            .map(|t| state.tender_listing(t))
            .collect())
    }

    async fn find_tender(&self, id: Uuid) -> Result<Option<TenderListing>, StoreError> {
        let state = self.state.lock();
        Ok(state.tender(id).map(|t| state.tender_listing(t)))
    }

    async fn tenders_created_by(&self, user_id: Uuid) -> Result<Vec<Tender>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .tenders
            .iter()
            .rev()
            .filter(|t| t.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn find_bid(&self, id: Uuid) -> Result<Option<Bid>, StoreError> {
        let state = self.state.lock();
        Ok(state.bids.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_bid(&self, bid: NewBid) -> Result<BidInsert, StoreError> {
        let mut state = self.state.lock();

        match state.tender(bid.tender_id) {
            None => return Ok(BidInsert::TenderMissing),
            Some(t) if !t.is_open() => return Ok(BidInsert::TenderNotOpen(t.status)),
            Some(_) => {}
        }

        if state
            .bids
            .iter()
            .any(|b| b.tender_id == bid.tender_id && b.bidder_id == bid.bidder.id)
        {
            return Ok(BidInsert::Duplicate);
        }

        let now = Utc::now();
        let record = Bid {
            id: Uuid::new_v4(),
            tender_id: bid.tender_id,
            bidder_id: bid.bidder.id,
            bid_amount: bid.bid_amount,
            documents: bid.documents,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        state.upsert_user(&bid.bidder);
        state.bids.push(record.clone());
        Ok(BidInsert::Created(record))
    }

    async fn award_bid(&self, tender_id: Uuid, bid_id: Uuid) -> Result<AwardOutcome, StoreError> {
        let mut state = self.state.lock();

        match state.tender(tender_id) {
            None => return Ok(AwardOutcome::TenderMissing),
            Some(t) if !t.is_open() => return Ok(AwardOutcome::TenderNotOpen(t.status)),
            Some(_) => {}
        }
        if !state
            .bids
            .iter()
            .any(|b| b.id == bid_id && b.tender_id == tender_id)
        {
            return Ok(AwardOutcome::BidNotOnTender);
        }

        let now = Utc::now();
        let mut rejected = 0;
        for bid in state.bids.iter_mut().filter(|b| b.tender_id == tender_id) {
            if bid.id == bid_id {
                bid.status = BidStatus::Accepted;
            } else {
                bid.status = BidStatus::Rejected;
                rejected += 1;
            }
            bid.updated_at = now;
        }
        debug_assert_eq!(
            state
                .bids
                .iter()
                .filter(|b| b.tender_id == tender_id && b.status.is_winning())
                .count(),
            1
        );

        if let Some(tender) = state.tender_mut(tender_id) {
            tender.status = TenderStatus::Awarded;
            tender.updated_at = now;
        }

        Ok(AwardOutcome::Awarded { rejected })
    }

    async fn complete_bid(
        &self,
        bid_id: Uuid,
        bidder_id: Uuid,
    ) -> Result<CompletionOutcome, StoreError> {
        let mut state = self.state.lock();
        let now = Utc::now();

        let Some(bid) = state.bids.iter_mut().find(|b| b.id == bid_id) else {
            return Ok(CompletionOutcome::BidMissing);
        };
        if bid.bidder_id != bidder_id {
            return Ok(CompletionOutcome::NotOwner);
        }
        if bid.status != BidStatus::Accepted {
            return Ok(CompletionOutcome::BidNotAccepted(bid.status));
        }
        bid.status = BidStatus::Completed;
        bid.updated_at = now;
        let tender_id = bid.tender_id;

        let tender_completed = match state.tender_mut(tender_id) {
            Some(tender) if tender.status == TenderStatus::Awarded => {
                tender.status = TenderStatus::Completed;
                tender.updated_at = now;
                true
            }
            _ => false,
        };

        Ok(CompletionOutcome::Completed {
            tender_id,
            tender_completed,
        })
    }

    async fn bids_for_tender(&self, tender_id: Uuid) -> Result<Vec<BidListing>, StoreError> {
        let state = self.state.lock();
        let mut listings: Vec<BidListing> = state
            .bids
            .iter()
            .filter(|b| b.tender_id == tender_id)
            .filter_map(|b| state.bid_listing(b))
            .collect();
        // Stable sort keeps submission order among equal amounts
        listings.sort_by(|a, b| a.bid.bid_amount.cmp(&b.bid.bid_amount));
        Ok(listings)
    }

    async fn bids_by_bidder(
        &self,
        bidder_id: Uuid,
        filter: &BidFilter,
    ) -> Result<Vec<BidListing>, StoreError> {
        let state = self.state.lock();
        Ok(state.bid_listings(
            state
                .bids
                .iter()
                .filter(|b| b.bidder_id == bidder_id && filter.matches(b)),
        ))
    }

    async fn bids_on_tenders_created_by(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BidListing>, StoreError> {
        let state = self.state.lock();
        Ok(state.bid_listings(state.bids.iter().filter(|b| {
            state
                .tender(b.tender_id)
                .is_some_and(|t| t.created_by == user_id)
        })))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, TenderCategory};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn new_tender(creator: &UserProfile) -> NewTender {
        NewTender {
            title: "Road resurfacing".to_string(),
            description: "Resurface 2km of the ring road".to_string(),
            category: TenderCategory::Construction,
            start_date: Utc::now(),
            end_date: Utc::now() + Duration::days(30),
            creator: creator.clone(),
            min_budget: None,
            max_budget: None,
            documents: vec![],
        }
    }

    fn new_bid(tender_id: Uuid, bidder: &UserProfile, amount: i64) -> NewBid {
        NewBid {
            tender_id,
            bidder: bidder.clone(),
            bid_amount: Decimal::from(amount),
            documents: vec![],
        }
    }

    fn created(outcome: BidInsert) -> Bid {
        match outcome {
            BidInsert::Created(bid) => bid,
            other => panic!("expected a created bid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_bid_is_reported() {
        let store = MemoryStore::new();
        let admin = UserProfile::bare(Uuid::new_v4(), Role::Admin);
        let bidder = UserProfile::bare(Uuid::new_v4(), Role::Bidder);
        let tender = store.insert_tender(new_tender(&admin)).await.unwrap();

        created(store.insert_bid(new_bid(tender.id, &bidder, 10)).await.unwrap());
        let second = store.insert_bid(new_bid(tender.id, &bidder, 9)).await.unwrap();

        assert_eq!(second, BidInsert::Duplicate);
    }

    #[tokio::test]
    async fn award_rejects_siblings_and_closes_tender() {
        let store = MemoryStore::new();
        let admin = UserProfile::bare(Uuid::new_v4(), Role::Admin);
        let tender = store.insert_tender(new_tender(&admin)).await.unwrap();
        let winner = created(
            store
                .insert_bid(new_bid(tender.id, &UserProfile::bare(Uuid::new_v4(), Role::Bidder), 100))
                .await
                .unwrap(),
        );
        for amount in [90, 95] {
            let bidder = UserProfile::bare(Uuid::new_v4(), Role::Bidder);
            created(store.insert_bid(new_bid(tender.id, &bidder, amount)).await.unwrap());
        }

        let outcome = store.award_bid(tender.id, winner.id).await.unwrap();
        assert_eq!(outcome, AwardOutcome::Awarded { rejected: 2 });

        let listings = store.bids_for_tender(tender.id).await.unwrap();
        assert_eq!(
            listings.iter().filter(|l| l.bid.status.is_winning()).count(),
            1
        );
        assert!(listings.iter().all(|l| l.tender.status == TenderStatus::Awarded));

        let again = store.award_bid(tender.id, winner.id).await.unwrap();
        assert_eq!(again, AwardOutcome::TenderNotOpen(TenderStatus::Awarded));
    }

    #[tokio::test]
    async fn award_refuses_bid_from_another_tender() {
        let store = MemoryStore::new();
        let admin = UserProfile::bare(Uuid::new_v4(), Role::Admin);
        let bidder = UserProfile::bare(Uuid::new_v4(), Role::Bidder);
        let first = store.insert_tender(new_tender(&admin)).await.unwrap();
        let second = store.insert_tender(new_tender(&admin)).await.unwrap();
        let bid = created(store.insert_bid(new_bid(first.id, &bidder, 5)).await.unwrap());

        let outcome = store.award_bid(second.id, bid.id).await.unwrap();

        assert_eq!(outcome, AwardOutcome::BidNotOnTender);
        let untouched = store.find_tender(second.id).await.unwrap().unwrap();
        assert_eq!(untouched.tender.status, TenderStatus::Open);
    }

    #[tokio::test]
    async fn bids_for_tender_are_cheapest_first() {
        let store = MemoryStore::new();
        let admin = UserProfile::bare(Uuid::new_v4(), Role::Admin);
        let tender = store.insert_tender(new_tender(&admin)).await.unwrap();
        for amount in [300, 100, 200] {
            let bidder = UserProfile::bare(Uuid::new_v4(), Role::Bidder);
            created(store.insert_bid(new_bid(tender.id, &bidder, amount)).await.unwrap());
        }

        let amounts: Vec<Decimal> = store
            .bids_for_tender(tender.id)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.bid.bid_amount)
            .collect();

        assert_eq!(
            amounts,
            vec![Decimal::from(100), Decimal::from(200), Decimal::from(300)]
        );
    }

    #[tokio::test]
    async fn profile_upsert_keeps_known_fields() {
        let store = MemoryStore::new();
        let admin = UserProfile::bare(Uuid::new_v4(), Role::Admin);
        let tender = store.insert_tender(new_tender(&admin)).await.unwrap();

        let mut bidder = UserProfile::bare(Uuid::new_v4(), Role::Bidder);
        bidder.company = Some("Acme Paving".to_string());
        {
            let mut state = store.state.lock();
            state.upsert_user(&bidder);
        }
        created(
            store
                .insert_bid(new_bid(tender.id, &UserProfile::bare(bidder.id, Role::Bidder), 1))
                .await
                .unwrap(),
        );

        let listing = store.bids_for_tender(tender.id).await.unwrap().remove(0);
        assert_eq!(
            listing.bidder.and_then(|b| b.company).as_deref(),
            Some("Acme Paving")
        );
    }
}
