pub mod bids;
pub mod health;
pub mod me;
pub mod tenders;

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Protected routes
        .route("/me", get(me::get_me))
        // Tenders (listing and detail are public)
        .route(
            "/tenders",
            get(tenders::list_tenders).post(tenders::create_tender),
        )
        .route("/tenders/:tender_id", get(tenders::get_tender))
        // Bids (nested under tenders)
        .route(
            "/tenders/:tender_id/bids",
            get(bids::list_bids).post(bids::create_bid),
        )
        .route("/bids/mine", get(bids::list_my_bids))
        .route("/bids/:bid_id/accept", put(bids::accept_bid))
        .route("/bids/:bid_id/complete", put(bids::complete_bid))
}
