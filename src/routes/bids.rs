use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{
    AcceptBidRequest, Award, Bid, BidFilter, BidListing, Completion, SubmitBidRequest,
};
use crate::error::ApiResult;

/// Submit a bid for a tender (bidders only)
pub async fn create_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubmitBidRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, DataResponse<Bid>)> {
    let Path(tender_id) = path?;
    let Json(req) = payload?;

    tracing::info!(
        user_id = %auth.user_id,
        tender_id = %tender_id,
        bid_amount = %req.bid_amount,
        "Submitting bid"
    );

    let bid = state.procurement.submit_bid(&auth, tender_id, req).await?;
    Ok(DataResponse::created(bid))
}

/// List bids for a tender, cheapest first (admin or tender creator)
pub async fn list_bids(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<DataResponse<Vec<BidListing>>> {
    let Path(tender_id) = path?;

    tracing::debug!(user_id = %auth.user_id, tender_id = %tender_id, "Listing bids");

    let bids = state
        .procurement
        .list_bids_for_tender(&auth, tender_id)
        .await?;
    Ok(DataResponse::new(bids))
}

/// List the caller's own bids, optionally filtered by tender or status
pub async fn list_my_bids(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    query: Result<Query<BidFilter>, QueryRejection>,
) -> ApiResult<DataResponse<Vec<BidListing>>> {
    let Query(filter) = query?;

    tracing::debug!(
        user_id = %auth.user_id,
        tender_id = ?filter.tender_id,
        status = ?filter.status,
        "Listing own bids"
    );

    let bids = state.procurement.list_my_bids(&auth, &filter).await?;
    Ok(DataResponse::new(bids))
}

/// Accept a bid and award its tender
pub async fn accept_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AcceptBidRequest>, JsonRejection>,
) -> ApiResult<MessageResponse<Award>> {
    let Path(bid_id) = path?;
    let Json(req) = payload?;

    tracing::info!(
        user_id = %auth.user_id,
        bid_id = %bid_id,
        tender_id = %req.tender_id,
        "Accepting bid"
    );

    let award = state
        .procurement
        .accept_bid(&auth, bid_id, req.tender_id)
        .await?;
    Ok(MessageResponse::with_code(
        "Bid accepted and tender awarded",
        "BID_ACCEPTED",
        award,
    ))
}

/// Mark an accepted bid as completed (bid owner only)
pub async fn complete_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<MessageResponse<Completion>> {
    let Path(bid_id) = path?;

    tracing::info!(user_id = %auth.user_id, bid_id = %bid_id, "Completing bid");

    let completion = state.procurement.complete_bid(&auth, bid_id).await?;
    Ok(MessageResponse::with_code(
        "Bid marked as completed",
        "BID_COMPLETED",
        completion,
    ))
}
