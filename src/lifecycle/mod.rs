//! Procurement lifecycle.
//!
//! `ProcurementManager` owns every legal state transition of tenders and
//! bids:
//!
//! - Tender: `open -> awarded -> completed`
//! - Bid: `pending -> accepted -> completed`, `pending -> rejected`
//!
//! Each operation takes the caller explicitly, runs one capability check,
//! and hands the transition to the store as a single atomic step.

mod access;
mod error;

pub use access::Capability;
pub use error::LifecycleError;

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    AdminActivity, Award, Bid, BidFilter, BidListing, BidStatus, BidderActivity, Completion,
    CreateTenderRequest, Dashboard, DocumentRef, DocumentUpload, Identity, NewBid, NewTender,
    Role, SubmitBidRequest, Tender, TenderListing, TenderStatus,
};
use crate::services::DocumentStore;
use crate::store::{AwardOutcome, BidInsert, CompletionOutcome, ProcurementStore, StoreError};

#[derive(Clone)]
pub struct ProcurementManager {
    store: Arc<dyn ProcurementStore>,
    documents: Arc<dyn DocumentStore>,
}

impl ProcurementManager {
    pub fn new(store: Arc<dyn ProcurementStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { store, documents }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }

    /// Publish a new open tender. Administrators only.
    pub async fn create_tender(
        &self,
        caller: &Identity,
        req: CreateTenderRequest,
    ) -> Result<Tender, LifecycleError> {
        caller.can(Capability::PublishTender).require()?;

        let now = Utc::now();
        req.validate(now)?;
        let documents = self.resolve_documents(&req.documents)?;

        let tender = self
            .store
            .insert_tender(NewTender {
                title: req.title.trim().to_string(),
                description: req.description,
                category: req.category,
                start_date: req.start_date.unwrap_or(now),
                end_date: req.end_date,
                creator: caller.profile.clone(),
                min_budget: req.min_budget,
                max_budget: req.max_budget,
                documents,
            })
            .await?;

        tracing::info!(
            tender_id = %tender.id,
            user_id = %caller.user_id,
            category = tender.category.as_str(),
            "Tender published"
        );
        Ok(tender)
    }

    pub async fn list_tenders(&self) -> Result<Vec<TenderListing>, LifecycleError> {
        Ok(self.store.list_tenders().await?)
    }

    pub async fn get_tender(&self, tender_id: Uuid) -> Result<TenderListing, LifecycleError> {
        self.store
            .find_tender(tender_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("Tender not found"))
    }

    /// Submit a pending bid on an open tender. Bidders only, one bid per tender.
    pub async fn submit_bid(
        &self,
        caller: &Identity,
        tender_id: Uuid,
        req: SubmitBidRequest,
    ) -> Result<Bid, LifecycleError> {
        caller.can(Capability::SubmitBid).require()?;
        req.validate()?;
        let documents = self.resolve_documents(&req.documents)?;

        let outcome = self
            .store
            .insert_bid(NewBid {
                tender_id,
                bidder: caller.profile.clone(),
                bid_amount: req.bid_amount,
                documents,
            })
            .await?;

        match outcome {
            BidInsert::Created(bid) => {
                tracing::info!(
                    bid_id = %bid.id,
                    tender_id = %tender_id,
                    user_id = %caller.user_id,
                    bid_amount = %bid.bid_amount,
                    "Bid submitted"
                );
                Ok(bid)
            }
            BidInsert::TenderMissing => Err(LifecycleError::not_found("Tender not found")),
            BidInsert::TenderNotOpen(status) => Err(LifecycleError::invalid_state(format!(
                "Cannot bid on a tender that is {status}"
            ))),
            BidInsert::Duplicate => Err(LifecycleError::conflict(
                "You have already submitted a bid for this tender",
            )),
        }
    }

    /// Accept one bid, reject its siblings and mark the tender awarded.
    ///
    /// Allowed for administrators and the tender's creator while the tender
    /// is open. When two awards race on the same tender exactly one commits;
    /// the other fails with `InvalidState`.
    pub async fn accept_bid(
        &self,
        caller: &Identity,
        bid_id: Uuid,
        tender_id: Uuid,
    ) -> Result<Award, LifecycleError> {
        let bid = self
            .store
            .find_bid(bid_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("Bid not found"))?;
        let tender = self.get_tender(tender_id).await?.tender;

        caller
            .can(Capability::ManageTender {
                creator: tender.created_by,
            })
            .require()?;

        if bid.tender_id != tender.id {
            return Err(LifecycleError::not_found("Bid not found for this tender"));
        }
        if !tender.is_open() {
            return Err(not_open(tender.status));
        }

        match self.store.award_bid(tender.id, bid.id).await? {
            AwardOutcome::Awarded { rejected } => {
                tracing::info!(
                    tender_id = %tender.id,
                    bid_id = %bid.id,
                    user_id = %caller.user_id,
                    rejected_bids = rejected,
                    "Bid accepted, tender awarded"
                );
                Ok(Award {
                    tender_id: tender.id,
                    bid_id: bid.id,
                    rejected_bids: rejected,
                })
            }
            AwardOutcome::TenderNotOpen(status) => {
                tracing::warn!(
                    tender_id = %tender.id,
                    bid_id = %bid.id,
                    status = %status,
                    "Tender left open state before award committed"
                );
                Err(not_open(status))
            }
            AwardOutcome::TenderMissing => Err(LifecycleError::not_found("Tender not found")),
            AwardOutcome::BidNotOnTender => {
                Err(LifecycleError::not_found("Bid not found for this tender"))
            }
        }
    }

    /// Mark an accepted bid completed, completing its tender when awarded.
    pub async fn complete_bid(
        &self,
        caller: &Identity,
        bid_id: Uuid,
    ) -> Result<Completion, LifecycleError> {
        let bid = self
            .store
            .find_bid(bid_id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("Bid not found"))?;

        caller
            .can(Capability::CompleteBid {
                bidder: bid.bidder_id,
            })
            .require()?;

        if bid.status != BidStatus::Accepted {
            return Err(not_accepted(bid.status));
        }

        match self.store.complete_bid(bid.id, caller.user_id).await? {
            CompletionOutcome::Completed {
                tender_id,
                tender_completed,
            } => {
                if tender_completed {
                    tracing::info!(
                        bid_id = %bid.id,
                        tender_id = %tender_id,
                        "Bid and tender completed"
                    );
                } else {
                    tracing::info!(
                        bid_id = %bid.id,
                        tender_id = %tender_id,
                        "Bid completed, tender was not awarded and keeps its status"
                    );
                }
                Ok(Completion {
                    bid_id: bid.id,
                    tender_id,
                    tender_completed,
                })
            }
            CompletionOutcome::BidMissing => Err(LifecycleError::not_found("Bid not found")),
            CompletionOutcome::NotOwner => Err(LifecycleError::forbidden(
                "Access denied. You can only mark your own bids as complete.",
            )),
            CompletionOutcome::BidNotAccepted(status) => Err(not_accepted(status)),
        }
    }

    /// All bids on a tender. Administrators and the tender's creator only.
    pub async fn list_bids_for_tender(
        &self,
        caller: &Identity,
        tender_id: Uuid,
    ) -> Result<Vec<BidListing>, LifecycleError> {
        let tender = self.get_tender(tender_id).await?.tender;
        caller
            .can(Capability::ManageTender {
                creator: tender.created_by,
            })
            .require()?;

        Ok(self.store.bids_for_tender(tender.id).await?)
    }

    /// The caller's own bids, optionally narrowed by tender and status.
    pub async fn list_my_bids(
        &self,
        caller: &Identity,
        filter: &BidFilter,
    ) -> Result<Vec<BidListing>, LifecycleError> {
        caller.can(Capability::ViewOwnBids).require()?;
        Ok(self.store.bids_by_bidder(caller.user_id, filter).await?)
    }

    /// Activity overview: published tenders for administrators, submitted
    /// bids for bidders.
    pub async fn dashboard(&self, caller: &Identity) -> Result<Dashboard, LifecycleError> {
        let mut dashboard = Dashboard {
            user: caller.profile.clone(),
            admin: None,
            bidder: None,
        };

        match caller.role {
            Role::Admin => {
                let (created_tenders, bids_on_my_tenders) = tokio::try_join!(
                    self.store.tenders_created_by(caller.user_id),
                    self.store.bids_on_tenders_created_by(caller.user_id),
                )?;
                let accepted_bids = with_status(&bids_on_my_tenders, BidStatus::Accepted);
                dashboard.admin = Some(AdminActivity {
                    created_tenders,
                    bids_on_my_tenders,
                    accepted_bids,
                });
            }
            Role::Bidder => {
                let all_submitted_bids = self
                    .store
                    .bids_by_bidder(caller.user_id, &BidFilter::default())
                    .await?;
                let ongoing_bids = all_submitted_bids
                    .iter()
                    .filter(|l| {
                        l.bid.status == BidStatus::Pending && l.tender.status == TenderStatus::Open
                    })
                    .cloned()
                    .collect();
                dashboard.bidder = Some(BidderActivity {
                    accepted_bids: with_status(&all_submitted_bids, BidStatus::Accepted),
                    completed_bids: with_status(&all_submitted_bids, BidStatus::Completed),
                    ongoing_bids,
                    all_submitted_bids,
                });
            }
        }

        Ok(dashboard)
    }

    fn resolve_documents(
        &self,
        uploads: &[DocumentUpload],
    ) -> Result<Vec<DocumentRef>, LifecycleError> {
        uploads
            .iter()
            .map(|upload| -> Result<DocumentRef, LifecycleError> {
                let doc = match &upload.file_url {
                    Some(url) => self.documents.accept_external(&upload.file_name, url)?,
                    None => self.documents.resolve(&upload.file_name)?,
                };
                Ok(doc)
            })
            .collect()
    }
}

fn not_open(status: TenderStatus) -> LifecycleError {
    LifecycleError::invalid_state(format!(
        "Tender is {status}, not open. Cannot accept bids."
    ))
}

fn not_accepted(status: BidStatus) -> LifecycleError {
    LifecycleError::invalid_state(format!(
        "Only accepted bids can be marked as complete (bid is {status})"
    ))
}

fn with_status(listings: &[BidListing], status: BidStatus) -> Vec<BidListing> {
    listings
        .iter()
        .filter(|l| l.bid.status == status)
        .cloned()
        .collect()
}
