//! PostgreSQL store.
//!
//! Multi-record transitions run inside a single transaction. Awards use a
//! conditional `UPDATE ... WHERE status = 'open'` on the tender row, so when
//! two awards race the second one blocks on the row lock, re-checks the
//! condition after the first commits and finds nothing to update. Bid
//! submission holds the tender row `FOR SHARE` while it inserts, and the
//! `(tender_id, bidder_id)` unique constraint settles duplicate bids.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use super::{AwardOutcome, BidInsert, CompletionOutcome, ProcurementStore, StoreError};
use crate::domain::{
    Bid, BidFilter, BidListing, DocumentRef, NewBid, NewTender, Tender, TenderListing,
    TenderStatus, TenderSummary, UserProfile,
};

// ============================================================================
// Database Row Types
// ============================================================================

const TENDER_COLUMNS: &str = "t.id, t.title, t.description, t.category, t.status, \
     t.start_date, t.end_date, t.created_by, t.min_budget, t.max_budget, t.documents, \
     t.created_at, t.updated_at";

const BID_COLUMNS: &str = "b.id, b.tender_id, b.bidder_id, b.bid_amount, b.documents, \
     b.status, b.created_at, b.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    status: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_by: Uuid,
    min_budget: Option<Decimal>,
    max_budget: Option<Decimal>,
    documents: Json<Vec<DocumentRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TenderRow> for Tender {
    type Error = StoreError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category.parse()?,
            status: row.status.parse()?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_by: row.created_by,
            min_budget: row.min_budget,
            max_budget: row.max_budget,
            documents: row.documents.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Display columns of a joined `users` row, all null when the user is unknown
#[derive(Debug, sqlx::FromRow)]
struct UserColumns {
    user_id: Option<Uuid>,
    user_role: Option<String>,
    user_username: Option<String>,
    user_email: Option<String>,
    user_company: Option<String>,
    user_contact: Option<String>,
}

impl UserColumns {
    fn into_profile(self) -> Result<Option<UserProfile>, StoreError> {
        let (Some(id), Some(role)) = (self.user_id, self.user_role) else {
            return Ok(None);
        };
        Ok(Some(UserProfile {
            id,
            role: role.parse()?,
            username: self.user_username,
            email: self.user_email,
            company: self.user_company,
            contact: self.user_contact,
        }))
    }
}

const USER_COLUMNS: &str = "u.id AS user_id, u.role AS user_role, u.username AS user_username, \
     u.email AS user_email, u.company AS user_company, u.contact AS user_contact";

#[derive(Debug, sqlx::FromRow)]
struct TenderListingRow {
    #[sqlx(flatten)]
    tender: TenderRow,
    #[sqlx(flatten)]
    creator: UserColumns,
}

impl TryFrom<TenderListingRow> for TenderListing {
    type Error = StoreError;

    fn try_from(row: TenderListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tender: row.tender.try_into()?,
            creator: row.creator.into_profile()?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    tender_id: Uuid,
    bidder_id: Uuid,
    bid_amount: Decimal,
    documents: Json<Vec<DocumentRef>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            tender_id: row.tender_id,
            bidder_id: row.bidder_id,
            bid_amount: row.bid_amount,
            documents: row.documents.0,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BidListingRow {
    #[sqlx(flatten)]
    bid: BidRow,
    tender_title: String,
    tender_description: String,
    tender_status: String,
    tender_end_date: DateTime<Utc>,
    #[sqlx(flatten)]
    bidder: UserColumns,
}

impl TryFrom<BidListingRow> for BidListing {
    type Error = StoreError;

    fn try_from(row: BidListingRow) -> Result<Self, Self::Error> {
        let tender = TenderSummary {
            id: row.bid.tender_id,
            title: row.tender_title,
            description: row.tender_description,
            status: row.tender_status.parse()?,
            end_date: row.tender_end_date,
        };
        Ok(Self {
            bid: row.bid.try_into()?,
            bidder: row.bidder.into_profile()?,
            tender,
        })
    }
}

// ============================================================================
// Query Helpers
// ============================================================================

fn tender_listing_query(tail: &str) -> String {
    format!(
        "SELECT {TENDER_COLUMNS}, {USER_COLUMNS} \
         FROM tenders t LEFT JOIN users u ON u.id = t.created_by {tail}"
    )
}

fn bid_listing_query(tail: &str) -> String {
    format!(
        "SELECT {BID_COLUMNS}, t.title AS tender_title, t.description AS tender_description, \
         t.status AS tender_status, t.end_date AS tender_end_date, {USER_COLUMNS} \
         FROM bids b \
         JOIN tenders t ON t.id = b.tender_id \
         LEFT JOIN users u ON u.id = b.bidder_id {tail}"
    )
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

async fn upsert_user(conn: &mut PgConnection, profile: &UserProfile) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, role, username, email, company, contact)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            role = EXCLUDED.role,
            username = COALESCE(EXCLUDED.username, users.username),
            email = COALESCE(EXCLUDED.email, users.email),
            company = COALESCE(EXCLUDED.company, users.company),
            contact = COALESCE(EXCLUDED.contact, users.contact),
            updated_at = NOW()
        "#,
    )
    .bind(profile.id)
    .bind(profile.role.as_str())
    .bind(&profile.username)
    .bind(&profile.email)
    .bind(&profile.company)
    .bind(&profile.contact)
    .execute(conn)
    .await?;
    Ok(())
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcurementStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_tender(&self, tender: NewTender) -> Result<Tender, StoreError> {
        let mut tx = self.pool.begin().await?;
        upsert_user(&mut tx, &tender.creator).await?;

        let row = sqlx::query_as::<_, TenderRow>(
            r#"
            INSERT INTO tenders AS t (title, description, category, start_date, end_date,
                                      created_by, min_budget, max_budget, documents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING t.id, t.title, t.description, t.category, t.status, t.start_date,
                      t.end_date, t.created_by, t.min_budget, t.max_budget, t.documents,
                      t.created_at, t.updated_at
            "#,
        )
        .bind(&tender.title)
        .bind(&tender.description)
        .bind(tender.category.as_str())
        .bind(tender.start_date)
        .bind(tender.end_date)
        .bind(tender.creator.id)
        .bind(tender.min_budget)
        .bind(tender.max_budget)
        .bind(Json(&tender.documents))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn list_tenders(&self) -> Result<Vec<TenderListing>, StoreError> {
        let rows = sqlx::query_as::<_, TenderListingRow>(&tender_listing_query(
            "ORDER BY t.created_at DESC",
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn find_tender(&self, id: Uuid) -> Result<Option<TenderListing>, StoreError> {
        sqlx::query_as::<_, TenderListingRow>(&tender_listing_query("WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TenderListing::try_from)
            .transpose()
    }

    async fn tenders_created_by(&self, user_id: Uuid) -> Result<Vec<Tender>, StoreError> {
        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders t WHERE t.created_by = $1 \
             ORDER BY t.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn find_bid(&self, id: Uuid) -> Result<Option<Bid>, StoreError> {
        sqlx::query_as::<_, BidRow>(&format!("SELECT {BID_COLUMNS} FROM bids b WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Bid::try_from)
            .transpose()
    }

    async fn insert_bid(&self, bid: NewBid) -> Result<BidInsert, StoreError> {
        let mut tx = self.pool.begin().await?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM tenders WHERE id = $1 FOR SHARE")
                .bind(bid.tender_id)
                .fetch_optional(&mut *tx)
                .await?;
        let status: TenderStatus = match status {
            None => {
                tx.rollback().await?;
                return Ok(BidInsert::TenderMissing);
            }
            Some(s) => s.parse()?,
        };
        if status != TenderStatus::Open {
            tx.rollback().await?;
            return Ok(BidInsert::TenderNotOpen(status));
        }

        upsert_user(&mut tx, &bid.bidder).await?;

        let row = sqlx::query_as::<_, BidRow>(
            r#"
            INSERT INTO bids AS b (tender_id, bidder_id, bid_amount, documents)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tender_id, bidder_id) DO NOTHING
            RETURNING b.id, b.tender_id, b.bidder_id, b.bid_amount, b.documents,
                      b.status, b.created_at, b.updated_at
            "#,
        )
        .bind(bid.tender_id)
        .bind(bid.bidder.id)
        .bind(bid.bid_amount)
        .bind(Json(&bid.documents))
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => {
                tx.commit().await?;
                Ok(BidInsert::Created(row.try_into()?))
            }
            None => {
                tx.rollback().await?;
                Ok(BidInsert::Duplicate)
            }
        }
    }

    async fn award_bid(&self, tender_id: Uuid, bid_id: Uuid) -> Result<AwardOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let swapped = sqlx::query(
            "UPDATE tenders SET status = 'awarded', updated_at = NOW() \
             WHERE id = $1 AND status = 'open'",
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if swapped == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM tenders WHERE id = $1")
                    .bind(tender_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return match current {
                None => Ok(AwardOutcome::TenderMissing),
                Some(status) => Ok(AwardOutcome::TenderNotOpen(status.parse()?)),
            };
        }

        let accepted = sqlx::query(
            "UPDATE bids SET status = 'accepted', updated_at = NOW() \
             WHERE id = $1 AND tender_id = $2",
        )
        .bind(bid_id)
        .bind(tender_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if accepted == 0 {
            tx.rollback().await?;
            return Ok(AwardOutcome::BidNotOnTender);
        }

        let rejected = sqlx::query(
            "UPDATE bids SET status = 'rejected', updated_at = NOW() \
             WHERE tender_id = $1 AND id <> $2",
        )
        .bind(tender_id)
        .bind(bid_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(AwardOutcome::Awarded { rejected })
    }

    async fn complete_bid(
        &self,
        bid_id: Uuid,
        bidder_id: Uuid,
    ) -> Result<CompletionOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let tender_id: Option<Uuid> = sqlx::query_scalar(
            "UPDATE bids SET status = 'completed', updated_at = NOW() \
             WHERE id = $1 AND bidder_id = $2 AND status = 'accepted' \
             RETURNING tender_id",
        )
        .bind(bid_id)
        .bind(bidder_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(tender_id) = tender_id else {
            let current: Option<(Uuid, String)> =
                sqlx::query_as("SELECT bidder_id, status FROM bids WHERE id = $1")
                    .bind(bid_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return match current {
                None => Ok(CompletionOutcome::BidMissing),
                Some((owner, _)) if owner != bidder_id => Ok(CompletionOutcome::NotOwner),
                Some((_, status)) => Ok(CompletionOutcome::BidNotAccepted(status.parse()?)),
            };
        };

        let tender_completed = sqlx::query(
            "UPDATE tenders SET status = 'completed', updated_at = NOW() \
             WHERE id = $1 AND status = 'awarded'",
        )
        .bind(tender_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        tx.commit().await?;
        Ok(CompletionOutcome::Completed {
            tender_id,
            tender_completed,
        })
    }

    async fn bids_for_tender(&self, tender_id: Uuid) -> Result<Vec<BidListing>, StoreError> {
        let rows = sqlx::query_as::<_, BidListingRow>(&bid_listing_query(
            "WHERE b.tender_id = $1 ORDER BY b.bid_amount ASC, b.created_at ASC",
        ))
        .bind(tender_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn bids_by_bidder(
        &self,
        bidder_id: Uuid,
        filter: &BidFilter,
    ) -> Result<Vec<BidListing>, StoreError> {
        let rows = sqlx::query_as::<_, BidListingRow>(&bid_listing_query(
            "WHERE b.bidder_id = $1 \
             AND ($2::uuid IS NULL OR b.tender_id = $2) \
             AND ($3::text IS NULL OR b.status = $3) \
             ORDER BY b.created_at DESC",
        ))
        .bind(bidder_id)
        .bind(filter.tender_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn bids_on_tenders_created_by(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BidListing>, StoreError> {
        let rows = sqlx::query_as::<_, BidListingRow>(&bid_listing_query(
            "WHERE t.created_by = $1 ORDER BY b.created_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
