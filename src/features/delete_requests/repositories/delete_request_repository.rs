use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::db_error;
use crate::core::error::{AppError, Result};
use crate::features::delete_requests::models::{
    DeleteRequest, DeleteRequestStatus, NewDeleteRequest,
};

const REQUEST_COLUMNS: &str = r#"
    id, note_id, note_title, requested_by, reason, status, reviewed_by,
    review_reason, reviewed_at, executed_at, created_at, updated_at
"#;

/// Persistence for delete requests.
///
/// At most one `pending` request exists per note; a second insert fails with
/// [`AppError::Conflict`]. Reviews are compare-and-swap on `pending`.
#[async_trait]
pub trait DeleteRequestRepository: Send + Sync {
    async fn insert(&self, request: NewDeleteRequest) -> Result<DeleteRequest>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeleteRequest>>;

    /// Oldest first, with the total matching count
    async fn list(
        &self,
        status: Option<DeleteRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DeleteRequest>, i64)>;

    /// Move a `pending` request to `approved` or `rejected`
    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: DeleteRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<DeleteRequest>>;

    /// Move an `approved` request to `executed`
    async fn mark_executed(&self, id: Uuid) -> Result<Option<DeleteRequest>>;
}

pub struct PgDeleteRequestRepository {
    pool: PgPool,
}

impl PgDeleteRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeleteRequestRepository for PgDeleteRequestRepository {
    async fn insert(&self, request: NewDeleteRequest) -> Result<DeleteRequest> {
        let sql = format!(
            r#"
            INSERT INTO delete_requests (id, note_id, note_title, requested_by, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, DeleteRequest>(&sql)
            .bind(Uuid::now_v7())
            .bind(request.note_id)
            .bind(&request.note_title)
            .bind(request.requested_by)
            .bind(&request.reason)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(
                    e,
                    "A delete request for this note is already pending",
                )
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeleteRequest>> {
        let sql = format!("SELECT {} FROM delete_requests WHERE id = $1", REQUEST_COLUMNS);
        sqlx::query_as::<_, DeleteRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get delete request"))
    }

    async fn list(
        &self,
        status: Option<DeleteRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DeleteRequest>, i64)> {
        let sql = format!(
            r#"
            SELECT {} FROM delete_requests
            WHERE ($1::delete_request_status IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
            REQUEST_COLUMNS
        );
        let items = sqlx::query_as::<_, DeleteRequest>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list delete requests"))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM delete_requests WHERE ($1::delete_request_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count delete requests"))?;

        Ok((items, total))
    }

    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: DeleteRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<DeleteRequest>> {
        let sql = format!(
            r#"
            UPDATE delete_requests SET
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
        sqlx::query_as::<_, DeleteRequest>(&sql)
            .bind(id)
            .bind(status)
            .bind(reviewer_id)
            .bind(review_reason)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to review delete request"))
    }

    async fn mark_executed(&self, id: Uuid) -> Result<Option<DeleteRequest>> {
        let sql = format!(
            r#"
            UPDATE delete_requests SET
                status = 'executed',
                executed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, DeleteRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to mark delete request executed"))
    }
}
