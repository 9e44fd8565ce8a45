use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::delete_requests::models::{DeleteRequest, DeleteRequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDeleteRequestDto {
    pub note_id: Uuid,

    #[validate(length(min = 1, max = 1000, message = "Reason must be 1-1000 characters"))]
    pub reason: String,
}

/// Reviewer comment. Required when rejecting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewDeleteRequestDto {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DeleteRequestQueryParams {
    pub status: Option<DeleteRequestStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRequestResponseDto {
    pub id: Uuid,
    pub note_id: Option<Uuid>,
    pub note_title: String,
    pub requested_by: Uuid,
    pub reason: String,
    pub status: DeleteRequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DeleteRequest> for DeleteRequestResponseDto {
    fn from(r: DeleteRequest) -> Self {
        Self {
            id: r.id,
            note_id: r.note_id,
            note_title: r.note_title,
            requested_by: r.requested_by,
            reason: r.reason,
            status: r.status,
            reviewed_by: r.reviewed_by,
            review_reason: r.review_reason,
            reviewed_at: r.reviewed_at,
            executed_at: r.executed_at,
            created_at: r.created_at,
        }
    }
}
