use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::core::database::db_error;
use crate::core::error::Result;
use crate::features::notes::models::{
    ModerationCounts, ModerationEvent, NewNote, Note, NoteChanges, NoteFilter, NoteStatus,
    StatusCounts,
};
use crate::shared::validation::contains_pattern;

const NOTE_COLUMNS: &str = r#"
    id, title, description, college, course, subcourse, program_level, semester,
    subject, upload_type, professor, year, tags,
    file_name, file_key, bucket, mime_type, file_size, checksum, uploaded_at,
    uploader_id, status, approved_by, approved_at, rejected_by, rejected_at,
    rejection_reason, moderation_history, search_keywords, download_count,
    created_at, updated_at
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::note_status IS NULL OR status = $1)
      AND ($2::text IS NULL OR college = $2)
      AND ($3::text IS NULL OR course = $3)
      AND ($4::text IS NULL OR subcourse = $4)
      AND ($5::program_level IS NULL OR program_level = $5)
      AND ($6::text IS NULL OR semester = $6)
      AND ($7::text IS NULL OR subject = $7)
      AND ($8::upload_type IS NULL OR upload_type = $8)
      AND ($9::uuid IS NULL OR uploader_id = $9)
      AND ($10::text IS NULL OR search_keywords LIKE $10 ESCAPE '\')
"#;

/// Persistence for notes.
///
/// Status transitions are compare-and-swap: they only touch a row still in
/// `pending` and return `None` otherwise. Moderation history is only ever
/// appended to.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert with status `pending` and history `[event]`
    async fn insert(&self, note: NewNote, event: ModerationEvent) -> Result<Note>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>>;

    async fn list(&self, filter: &NoteFilter, limit: i64, offset: i64) -> Result<(Vec<Note>, i64)>;

    async fn mark_approved(
        &self,
        id: Uuid,
        actor_id: Option<Uuid>,
        event: ModerationEvent,
    ) -> Result<Option<Note>>;

    async fn mark_rejected(
        &self,
        id: Uuid,
        actor_id: Uuid,
        reason: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>>;

    async fn append_history(&self, id: Uuid, event: ModerationEvent) -> Result<Option<Note>>;

    async fn update_file_key(&self, id: Uuid, file_key: &str) -> Result<Option<Note>>;

    async fn update_details(
        &self,
        id: Uuid,
        changes: &NoteChanges,
        search_keywords: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>>;

    async fn increment_downloads(&self, id: Uuid) -> Result<()>;

    /// `false` when no record was removed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn status_counts(&self, uploader_id: Option<Uuid>) -> Result<StatusCounts>;

    async fn moderation_counts(&self, moderator_id: Uuid) -> Result<ModerationCounts>;

    /// Approved notes whose blob key still starts with `prefix/`
    async fn list_stranded(&self, prefix: &str, limit: i64) -> Result<Vec<Note>>;
}

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn search_pattern(filter: &NoteFilter) -> Option<String> {
    filter
        .search
        .as_ref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| contains_pattern(&s))
}

fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &'q NoteFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.status)
        .bind(filter.college.as_deref())
        .bind(filter.course.as_deref())
        .bind(filter.subcourse.as_deref())
        .bind(filter.program_level)
        .bind(filter.semester.as_deref())
        .bind(filter.subject.as_deref())
        .bind(filter.upload_type)
        .bind(filter.uploader_id)
        .bind(search_pattern(filter))
}

fn fold_counts(rows: Vec<(NoteStatus, i64)>) -> StatusCounts {
    rows.into_iter()
        .fold(StatusCounts::default(), |mut counts, (status, n)| {
            match status {
                NoteStatus::Pending => counts.pending = n,
                NoteStatus::Approved => counts.approved = n,
                NoteStatus::Rejected => counts.rejected = n,
            }
            counts
        })
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, note: NewNote, event: ModerationEvent) -> Result<Note> {
        let sql = format!(
            r#"
            INSERT INTO notes (
                id, title, description, college, course, subcourse, program_level,
                semester, subject, upload_type, professor, year, tags,
                file_name, file_key, bucket, mime_type, file_size, checksum, uploaded_at,
                uploader_id, status, moderation_history, search_keywords
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, 'pending', $22, $23
            )
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(note.id)
            .bind(&note.title)
            .bind(&note.description)
            .bind(&note.college)
            .bind(&note.course)
            .bind(&note.subcourse)
            .bind(note.program_level)
            .bind(&note.semester)
            .bind(&note.subject)
            .bind(note.upload_type)
            .bind(&note.professor)
            .bind(note.year)
            .bind(&note.tags)
            .bind(&note.file.file_name)
            .bind(&note.file.file_key)
            .bind(&note.file.bucket)
            .bind(&note.file.mime_type)
            .bind(note.file.file_size)
            .bind(&note.file.checksum)
            .bind(note.file.uploaded_at)
            .bind(note.uploader_id)
            .bind(Json(vec![event]))
            .bind(&note.search_keywords)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to insert note"))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get note by ID"))
    }

    async fn list(&self, filter: &NoteFilter, limit: i64, offset: i64) -> Result<(Vec<Note>, i64)> {
        let sql = format!(
            "SELECT {} FROM notes {} ORDER BY created_at DESC LIMIT $11 OFFSET $12",
            NOTE_COLUMNS, FILTER_CLAUSE
        );
        let notes = bind_filter(sqlx::query_as::<_, Note>(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list notes"))?;

        let count_sql = format!("SELECT COUNT(*) FROM notes {}", FILTER_CLAUSE);
        let (total,) = bind_filter(sqlx::query_as::<_, (i64,)>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count notes"))?;

        Ok((notes, total))
    }

    async fn mark_approved(
        &self,
        id: Uuid,
        actor_id: Option<Uuid>,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        let sql = format!(
            r#"
            UPDATE notes SET
                status = 'approved',
                approved_by = $2,
                approved_at = NOW(),
                moderation_history = moderation_history || $3,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(actor_id)
            .bind(Json(vec![event]))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to approve note"))
    }

    async fn mark_rejected(
        &self,
        id: Uuid,
        actor_id: Uuid,
        reason: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        let sql = format!(
            r#"
            UPDATE notes SET
                status = 'rejected',
                rejected_by = $2,
                rejected_at = NOW(),
                rejection_reason = $3,
                moderation_history = moderation_history || $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(actor_id)
            .bind(reason)
            .bind(Json(vec![event]))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to reject note"))
    }

    async fn append_history(&self, id: Uuid, event: ModerationEvent) -> Result<Option<Note>> {
        let sql = format!(
            r#"
            UPDATE notes SET
                moderation_history = moderation_history || $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(Json(vec![event]))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to append moderation history"))
    }

    async fn update_file_key(&self, id: Uuid, file_key: &str) -> Result<Option<Note>> {
        let sql = format!(
            "UPDATE notes SET file_key = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(file_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update note file key"))
    }

    async fn update_details(
        &self,
        id: Uuid,
        changes: &NoteChanges,
        search_keywords: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        let sql = format!(
            r#"
            UPDATE notes SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                professor = COALESCE($4, professor),
                year = COALESCE($5, year),
                tags = COALESCE($6, tags),
                search_keywords = $7,
                moderation_history = moderation_history || $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.professor)
            .bind(changes.year)
            .bind(&changes.tags)
            .bind(search_keywords)
            .bind(Json(vec![event]))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update note"))
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notes SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to increment download count"))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete note"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn status_counts(&self, uploader_id: Option<Uuid>) -> Result<StatusCounts> {
        let rows: Vec<(NoteStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM notes
            WHERE ($1::uuid IS NULL OR uploader_id = $1)
            GROUP BY status
            "#,
        )
        .bind(uploader_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count notes by status"))?;

        Ok(fold_counts(rows))
    }

    async fn moderation_counts(&self, moderator_id: Uuid) -> Result<ModerationCounts> {
        let (approved, rejected): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE approved_by = $1),
                COUNT(*) FILTER (WHERE rejected_by = $1)
            FROM notes
            "#,
        )
        .bind(moderator_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count moderation decisions"))?;

        Ok(ModerationCounts { approved, rejected })
    }

    async fn list_stranded(&self, prefix: &str, limit: i64) -> Result<Vec<Note>> {
        let sql = format!(
            r#"
            SELECT {} FROM notes
            WHERE status = 'approved' AND file_key LIKE $1 || '/%'
            ORDER BY approved_at ASC
            LIMIT $2
            "#,
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(prefix)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list stranded notes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_is_lowercased_and_wrapped() {
        let filter = NoteFilter {
            search: Some("  Operating Systems ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            search_pattern(&filter),
            Some("%operating systems%".to_string())
        );
        assert_eq!(search_pattern(&NoteFilter::default()), None);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = NoteFilter {
            search: Some("unit_1".to_string()),
            ..Default::default()
        };
        assert_eq!(search_pattern(&filter), Some(r"%unit\_1%".to_string()));
    }

    #[test]
    fn test_fold_counts() {
        let counts = fold_counts(vec![(NoteStatus::Pending, 2), (NoteStatus::Rejected, 1)]);
        assert_eq!(
            counts,
            StatusCounts {
                pending: 2,
                approved: 0,
                rejected: 1
            }
        );
        assert_eq!(counts.total(), 3);
    }
}
