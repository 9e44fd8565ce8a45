use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::db_error;
use crate::core::error::Result;
use crate::features::notifications::models::{NewNotification, Notification};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> Result<Notification>;

    /// Newest first, with the total matching count
    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;

    /// `None` when the notification does not exist or belongs to someone else
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Option<Notification>>;

    /// Number of notifications flipped to read
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;
}

pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> Result<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, note_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, kind, title, message, note_id, is_read, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert notification"))
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let items = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, kind, title, message, note_id, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list notifications"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count notifications"))?;

        Ok((items, total))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count unread notifications"))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, kind, title, message, note_id, is_read, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to mark notification as read"))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notifications as read"))?;

        Ok(result.rows_affected())
    }
}
