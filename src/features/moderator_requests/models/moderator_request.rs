use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "moderator_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModeratorRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModeratorRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeratorRequestStatus::Pending => "pending",
            ModeratorRequestStatus::Approved => "approved",
            ModeratorRequestStatus::Rejected => "rejected",
        }
    }
}

/// Database model for moderator request
#[derive(Debug, Clone, FromRow)]
pub struct ModeratorRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub motivation: String,
    pub status: ModeratorRequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
