use std::sync::Arc;

use axum::{extract::State, Json};

use crate::core::error::Result;
use crate::features::auth::guards::RequireAdmin;
use crate::features::notes::dtos::ReconcileReportDto;
use crate::features::notes::ModerationService;
use crate::shared::types::ApiResponse;

/// Move approved notes whose files were left under the pending prefix
#[utoipa::path(
    post,
    path = "/api/admin/storage/reconcile",
    responses(
        (status = 200, description = "Reconciliation finished", body = ApiResponse<ReconcileReportDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reconcile_storage(
    RequireAdmin(actor): RequireAdmin,
    State(service): State<Arc<ModerationService>>,
) -> Result<Json<ApiResponse<ReconcileReportDto>>> {
    let report = service.reconcile_storage(&actor).await?;
    Ok(Json(ApiResponse::success(Some(report), None, None)))
}
