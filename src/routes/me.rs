use axum::extract::State;
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::Dashboard;
use crate::error::ApiResult;

/// Current user with their procurement activity
pub async fn get_me(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<Dashboard>> {
    tracing::debug!(user_id = %auth.user_id, role = %auth.role, "Loading dashboard");

    let dashboard = state.procurement.dashboard(&auth).await?;
    Ok(DataResponse::new(dashboard))
}
