use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::{CreateTenderRequest, Tender, TenderListing};
use crate::error::ApiResult;

/// Publish a new tender (admin only)
pub async fn create_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTenderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, DataResponse<Tender>)> {
    let Json(req) = payload?;

    tracing::info!(
        user_id = %auth.user_id,
        title = %req.title,
        category = req.category.as_str(),
        "Creating tender"
    );

    let tender = state.procurement.create_tender(&auth, req).await?;
    Ok(DataResponse::created(tender))
}

/// List every tender, newest first - public
pub async fn list_tenders(
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<Vec<TenderListing>>> {
    let tenders = state.procurement.list_tenders().await?;

    tracing::debug!(count = tenders.len(), "Listing tenders");
    Ok(DataResponse::new(tenders))
}

/// Get a single tender - public
pub async fn get_tender(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<DataResponse<TenderListing>> {
    let Path(tender_id) = path?;

    let tender = state.procurement.get_tender(tender_id).await?;
    Ok(DataResponse::new(tender))
}
