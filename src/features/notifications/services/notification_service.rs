use minijinja::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::hub::{NotificationHub, NotificationStream};
use crate::core::error::{AppError, Result};
use crate::features::notifications::dtos::NotificationResponseDto;
use crate::features::notifications::models::{NewNotification, NotificationKind};
use crate::features::notifications::repositories::NotificationRepository;
use crate::shared::templates::render_title_and_message;
use crate::shared::types::PaginationQuery;

/// Persists user notifications and pushes them to live subscribers
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    hub: Arc<dyn NotificationHub>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>, hub: Arc<dyn NotificationHub>) -> Self {
        Self { repository, hub }
    }

    /// Render, store and publish a notification.
    ///
    /// Never fails: a notification that cannot be rendered or stored is
    /// logged and dropped so the triggering action is unaffected.
    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        note_id: Option<Uuid>,
        ctx: Value,
    ) {
        let (title, message) = match render_title_and_message(&kind.template_name(), ctx) {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!("Failed to render {} notification: {}", kind.as_str(), e);
                return;
            }
        };

        let new = NewNotification {
            user_id,
            kind,
            title,
            message,
            note_id,
        };

        match self.repository.insert(new).await {
            Ok(notification) => {
                tracing::debug!(
                    "Notification {} ({}) created for user {}",
                    notification.id,
                    kind.as_str(),
                    user_id
                );
                self.hub.publish(user_id, notification.into());
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to store {} notification for user {}: {}",
                    kind.as_str(),
                    user_id,
                    e
                );
            }
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<NotificationResponseDto>, i64)> {
        let (items, total) = self
            .repository
            .list(user_id, unread_only, pagination.limit(), pagination.offset())
            .await?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.repository.unread_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationResponseDto> {
        self.repository
            .mark_read(user_id, id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Notification '{}' not found", id)))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        self.repository.mark_all_read(user_id).await
    }

    pub fn subscribe(&self, user_id: Uuid) -> NotificationStream {
        self.hub.subscribe(user_id)
    }
}
