use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::moderator_requests::models::{ModeratorRequest, ModeratorRequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplyModeratorDto {
    /// Why the applicant wants to moderate
    #[validate(length(min = 20, max = 2000, message = "Motivation must be 20-2000 characters"))]
    pub motivation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewModeratorRequestDto {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ModeratorRequestQueryParams {
    pub status: Option<ModeratorRequestStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModeratorRequestResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub motivation: String,
    pub status: ModeratorRequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ModeratorRequest> for ModeratorRequestResponseDto {
    fn from(r: ModeratorRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            motivation: r.motivation,
            status: r.status,
            reviewed_by: r.reviewed_by,
            review_reason: r.review_reason,
            reviewed_at: r.reviewed_at,
            created_at: r.created_at,
        }
    }
}
