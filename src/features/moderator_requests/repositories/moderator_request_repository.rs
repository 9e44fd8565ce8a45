use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::db_error;
use crate::core::error::{AppError, Result};
use crate::features::moderator_requests::models::{ModeratorRequest, ModeratorRequestStatus};

const REQUEST_COLUMNS: &str = r#"
    id, user_id, motivation, status, reviewed_by, review_reason, reviewed_at,
    created_at, updated_at
"#;

/// Persistence for moderator applications. One `pending` application per user.
#[async_trait]
pub trait ModeratorRequestRepository: Send + Sync {
    /// Fails with [`AppError::Conflict`] when the user already has a pending application
    async fn insert(&self, user_id: Uuid, motivation: &str) -> Result<ModeratorRequest>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ModeratorRequest>>;

    /// Most recent application of a user
    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ModeratorRequest>>;

    async fn list(
        &self,
        status: Option<ModeratorRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ModeratorRequest>, i64)>;

    /// Compare-and-swap from `pending`
    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: ModeratorRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<ModeratorRequest>>;
}

pub struct PgModeratorRequestRepository {
    pool: PgPool,
}

impl PgModeratorRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModeratorRequestRepository for PgModeratorRequestRepository {
    async fn insert(&self, user_id: Uuid, motivation: &str) -> Result<ModeratorRequest> {
        let sql = format!(
            r#"
            INSERT INTO moderator_requests (id, user_id, motivation)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ModeratorRequest>(&sql)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(motivation)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(e, "You already have a pending application")
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ModeratorRequest>> {
        let sql = format!(
            "SELECT {} FROM moderator_requests WHERE id = $1",
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ModeratorRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get moderator request"))
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ModeratorRequest>> {
        let sql = format!(
            r#"
            SELECT {} FROM moderator_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ModeratorRequest>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get latest moderator request"))
    }

    async fn list(
        &self,
        status: Option<ModeratorRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ModeratorRequest>, i64)> {
        let sql = format!(
            r#"
            SELECT {} FROM moderator_requests
            WHERE ($1::moderator_request_status IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
            REQUEST_COLUMNS
        );
        let items = sqlx::query_as::<_, ModeratorRequest>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list moderator requests"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM moderator_requests WHERE ($1::moderator_request_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count moderator requests"))?;

        Ok((items, total))
    }

    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: ModeratorRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<ModeratorRequest>> {
        let sql = format!(
            r#"
            UPDATE moderator_requests SET
                status = $2,
                reviewed_by = $3,
                review_reason = $4,
                reviewed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, ModeratorRequest>(&sql)
            .bind(id)
            .bind(status)
            .bind(reviewer_id)
            .bind(review_reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to review moderator request"))
    }
}
