use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// `pending` -> `approved` -> `executed`, or `pending` -> `rejected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "delete_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeleteRequestStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
}

impl std::fmt::Display for DeleteRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteRequestStatus::Pending => write!(f, "pending"),
            DeleteRequestStatus::Approved => write!(f, "approved"),
            DeleteRequestStatus::Rejected => write!(f, "rejected"),
            DeleteRequestStatus::Executed => write!(f, "executed"),
        }
    }
}

/// Database model for delete request
#[derive(Debug, Clone, FromRow)]
pub struct DeleteRequest {
    pub id: Uuid,
    /// Cleared once the note is gone
    pub note_id: Option<Uuid>,
    /// Title at request time, kept after the note is deleted
    pub note_title: String,
    pub requested_by: Uuid,
    pub reason: String,
    pub status: DeleteRequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDeleteRequest {
    pub note_id: Uuid,
    pub note_title: String,
    pub requested_by: Uuid,
    pub reason: String,
}
