use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NoteApproved,
    NoteRejected,
    NoteDeleted,
    DeleteRequestResolved,
    ModeratorRequestResolved,
    RoleChanged,
    AccountStatusChanged,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::NoteApproved => "note_approved",
            NotificationKind::NoteRejected => "note_rejected",
            NotificationKind::NoteDeleted => "note_deleted",
            NotificationKind::DeleteRequestResolved => "delete_request_resolved",
            NotificationKind::ModeratorRequestResolved => "moderator_request_resolved",
            NotificationKind::RoleChanged => "role_changed",
            NotificationKind::AccountStatusChanged => "account_status_changed",
        }
    }

    pub fn template_name(self) -> String {
        format!("notifications/{}.jinja", self.as_str())
    }
}

/// Database model for notification
#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub note_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub note_id: Option<Uuid>,
}
