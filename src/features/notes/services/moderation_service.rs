use chrono::Utc;
use minijinja::context;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::config::{AutoApprovePolicy, ModerationConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use crate::features::notes::dtos::{
    NoteResponseDto, ReconcileReportDto, UpdateNoteDto, UploadNoteDto, UploadedFile,
};
use crate::features::notes::models::{
    search_keywords, FileRef, ModerationAction, ModerationEvent, NewNote, Note, NoteChanges,
    NoteState, Transition,
};
use crate::features::notes::repositories::NoteRepository;
use crate::features::notes::services::storage_key::{
    build_storage_key, empty_segment, is_pending_key, key_file_name, KeyLocation,
};
use crate::features::notifications::models::NotificationKind;
use crate::features::notifications::NotificationService;
use crate::features::users::UserService;
use crate::modules::storage::{ObjectStore, StoreError};
use crate::shared::constants::{is_mime_type_allowed, ALLOWED_MIME_TYPES, PENDING_PREFIX};
use validator::Validate;

/// Stranded notes handled per reconciliation sweep
const RECONCILE_BATCH: i64 = 500;

/// Write side of notes: upload, approve, reject, delete, edit.
///
/// Status changes are claimed with a compare-and-swap in the repository before
/// any blob is touched, so the record is the source of truth and blob moves
/// are at-least-once.
pub struct ModerationService {
    notes: Arc<dyn NoteRepository>,
    store: Arc<dyn ObjectStore>,
    users: Arc<UserService>,
    notifications: Arc<NotificationService>,
    config: ModerationConfig,
}

fn location_of(note: &Note) -> KeyLocation<'_> {
    KeyLocation {
        college: &note.college,
        program_level: note.program_level,
        course: &note.course,
        subcourse: note.subcourse.as_deref(),
        semester: &note.semester,
        subject: &note.subject,
        upload_type: note.upload_type,
    }
}

/// `image/png; charset=binary` -> `image/png`
fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or(raw)
        .trim()
        .to_lowercase()
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ModerationService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        store: Arc<dyn ObjectStore>,
        users: Arc<UserService>,
        notifications: Arc<NotificationService>,
        config: ModerationConfig,
    ) -> Self {
        Self {
            notes,
            store,
            users,
            notifications,
            config,
        }
    }

    async fn find(&self, id: Uuid) -> Result<Note> {
        self.notes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note '{}' not found", id)))
    }

    /// Error for a compare-and-swap that matched no pending row
    async fn lost_transition(&self, id: Uuid, transition: Transition) -> AppError {
        let current = match self.notes.find_by_id(id).await {
            Ok(current) => current,
            Err(e) => return e,
        };
        match NoteState::of(current.as_ref()).apply(transition, id) {
            Err(e) => e,
            Ok(_) => AppError::Conflict(format!("Note '{}' changed concurrently", id)),
        }
    }

    /// Delete a blob, logging instead of failing. A missing key counts as deleted.
    async fn discard_blob(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => tracing::warn!("Failed to delete blob '{}': {}", key, e),
        }
    }

    fn should_auto_approve(&self, uploader: Option<&AuthenticatedUser>) -> bool {
        match self.config.auto_approve {
            AutoApprovePolicy::Off => false,
            AutoApprovePolicy::Moderators => uploader.is_some_and(|u| u.is_moderator()),
            AutoApprovePolicy::All => true,
        }
    }

    /// Store a new note as `pending`, or approve it right away when the
    /// auto-approval policy covers the uploader
    pub async fn upload(
        &self,
        uploader: Option<&AuthenticatedUser>,
        metadata: UploadNoteDto,
        file: UploadedFile,
    ) -> Result<NoteResponseDto> {
        metadata
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if file.data.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if file.data.len() > self.config.max_upload_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.config.max_upload_size,
                self.config.max_upload_size / 1024 / 1024
            )));
        }
        let content_type = normalize_content_type(&file.content_type);
        if !is_mime_type_allowed(&content_type) {
            return Err(AppError::BadRequest(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                ALLOWED_MIME_TYPES.join(", ")
            )));
        }

        let title = metadata.title.trim().to_string();
        let subcourse = trimmed(metadata.subcourse);
        let professor = trimmed(metadata.professor);
        let tags = clean_tags(metadata.tags);
        let now = Utc::now();

        let location = KeyLocation {
            college: &metadata.college,
            program_level: metadata.program_level,
            course: &metadata.course,
            subcourse: subcourse.as_deref(),
            semester: &metadata.semester,
            subject: &metadata.subject,
            upload_type: metadata.upload_type,
        };
        if let Some(field) = empty_segment(&location) {
            return Err(AppError::Validation(format!(
                "{} must contain letters or digits",
                field
            )));
        }
        let key = build_storage_key(
            &location,
            &file.file_name,
            &content_type,
            true,
            now.timestamp_millis(),
        );

        let checksum = hex::encode(Sha256::digest(&file.data));
        let file_size = file.data.len() as i64;
        self.store.put(&key, file.data, &content_type).await?;

        let keywords = search_keywords(
            &title,
            &metadata.subject,
            &metadata.course,
            subcourse.as_deref(),
            professor.as_deref(),
            &tags,
        );
        let uploader_id = uploader.map(|u| u.user_id);
        let new_note = NewNote {
            id: Uuid::now_v7(),
            title,
            description: trimmed(metadata.description),
            college: metadata.college,
            course: metadata.course.trim().to_string(),
            subcourse,
            program_level: metadata.program_level,
            semester: metadata.semester,
            subject: metadata.subject.trim().to_string(),
            upload_type: metadata.upload_type,
            professor,
            year: metadata.year,
            tags,
            file: FileRef {
                file_name: file.file_name,
                file_key: key.clone(),
                bucket: self.store.bucket_name(),
                mime_type: content_type,
                file_size,
                checksum: Some(checksum),
                uploaded_at: now,
            },
            uploader_id,
            search_keywords: keywords,
        };

        let event = ModerationEvent::new(ModerationAction::Uploaded, uploader_id);
        let note = match self.notes.insert(new_note, event).await {
            Ok(note) => note,
            Err(e) => {
                self.discard_blob(&key).await;
                return Err(e);
            }
        };

        tracing::info!(
            "Note {} uploaded by {}",
            note.id,
            uploader_id.map_or_else(|| "guest".to_string(), |id| id.to_string())
        );

        if self.should_auto_approve(uploader) {
            let approved = self.approve_as(note.id, uploader_id).await?;
            return Ok(approved.into());
        }

        self.users.refresh_stats(&[uploader_id]).await;
        Ok(note.into())
    }

    pub async fn approve(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<NoteResponseDto> {
        policy::require(actor.role, Role::Moderator)?;
        Ok(self.approve_as(id, Some(actor.user_id)).await?.into())
    }

    async fn approve_as(&self, id: Uuid, actor_id: Option<Uuid>) -> Result<Note> {
        let event = ModerationEvent::new(ModerationAction::Approved, actor_id);
        let note = match self.notes.mark_approved(id, actor_id, event).await? {
            Some(note) => note,
            None => return Err(self.lost_transition(id, Transition::Approve).await),
        };

        tracing::info!("Note {} approved by {:?}", id, actor_id);
        let note = self.relocate(note).await;

        self.users.refresh_stats(&[note.uploader_id, actor_id]).await;
        if let Some(uploader_id) = note.uploader_id.filter(|u| Some(*u) != actor_id) {
            self.notifications
                .notify(
                    uploader_id,
                    NotificationKind::NoteApproved,
                    Some(note.id),
                    context! { note_title => &note.title, college => &note.college },
                )
                .await;
        }

        Ok(note)
    }

    async fn move_to_approved(&self, note: &Note) -> Result<Note> {
        let source = note.file.file_key.as_str();
        let dest = build_storage_key(
            &location_of(note),
            key_file_name(source),
            &note.file.mime_type,
            false,
            Utc::now().timestamp_millis(),
        );

        self.store.copy(source, &dest).await?;
        let updated = self
            .notes
            .update_file_key(note.id, &dest)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note '{}' not found", note.id)))?;
        self.discard_blob(source).await;

        tracing::debug!("Note {} blob moved {} -> {}", note.id, source, dest);
        Ok(updated)
    }

    /// Move an approved note's blob out of the pending prefix.
    ///
    /// Failures leave the blob at its old key and are only logged.
    async fn relocate(&self, note: Note) -> Note {
        if !is_pending_key(&note.file.file_key) {
            return note;
        }
        match self.move_to_approved(&note).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(
                    "Failed to relocate blob of approved note {} ('{}'): {}",
                    note.id,
                    note.file.file_key,
                    e
                );
                note
            }
        }
    }

    pub async fn reject(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        reason: &str,
    ) -> Result<NoteResponseDto> {
        policy::require(actor.role, Role::Moderator)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }

        let event =
            ModerationEvent::new(ModerationAction::Rejected, Some(actor.user_id)).with_reason(reason);
        let note = match self
            .notes
            .mark_rejected(id, actor.user_id, reason, event)
            .await?
        {
            Some(note) => note,
            None => return Err(self.lost_transition(id, Transition::Reject).await),
        };

        tracing::info!("Note {} rejected by {}", id, actor.user_id);
        self.discard_blob(&note.file.file_key).await;

        self.users
            .refresh_stats(&[note.uploader_id, Some(actor.user_id)])
            .await;
        if let Some(uploader_id) = note.uploader_id {
            self.notifications
                .notify(
                    uploader_id,
                    NotificationKind::NoteRejected,
                    Some(note.id),
                    context! { note_title => &note.title, reason => reason },
                )
                .await;
        }

        Ok(note.into())
    }

    /// Delete a note outright. Owners and senior moderators only; other
    /// moderators go through delete requests.
    pub async fn delete(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<()> {
        let note = self.find(id).await?;

        if !note.is_owned_by(actor.user_id) && !actor.is_senior_moderator() {
            let message = if actor.is_moderator() {
                "Moderators must file a delete request for notes they do not own"
            } else {
                "You can only delete your own notes"
            };
            return Err(AppError::Forbidden(message.to_string()));
        }

        if !self.purge(&note, Some(actor.user_id), None).await? {
            return Err(AppError::NotFound(format!("Note '{}' not found", id)));
        }
        Ok(())
    }

    /// Remove a note's blob and record, refresh the uploader's statistics and
    /// tell them. `false` when the record was already gone.
    pub async fn purge(
        &self,
        note: &Note,
        actor_id: Option<Uuid>,
        reason: Option<&str>,
    ) -> Result<bool> {
        NoteState::of(Some(note)).apply(Transition::Delete, note.id)?;

        self.discard_blob(&note.file.file_key).await;
        if !self.notes.delete(note.id).await? {
            return Ok(false);
        }

        tracing::info!("Note {} deleted by {:?}", note.id, actor_id);

        self.users.refresh_stats(&[note.uploader_id]).await;
        if let Some(uploader_id) = note.uploader_id.filter(|u| Some(*u) != actor_id) {
            self.notifications
                .notify(
                    uploader_id,
                    NotificationKind::NoteDeleted,
                    None,
                    context! { note_title => &note.title, reason => reason },
                )
                .await;
        }

        Ok(true)
    }

    /// Update descriptive fields; the blob stays where it is
    pub async fn edit(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: UpdateNoteDto,
    ) -> Result<NoteResponseDto> {
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let note = self.find(id).await?;
        if !note.is_owned_by(actor.user_id) && !actor.is_moderator() {
            return Err(AppError::Forbidden(
                "You can only edit your own notes".to_string(),
            ));
        }

        let changes = NoteChanges {
            title: trimmed(dto.title),
            description: dto.description.map(|d| d.trim().to_string()),
            professor: dto.professor.map(|p| p.trim().to_string()),
            year: dto.year,
            tags: dto.tags.map(clean_tags),
        };

        let professor = changes.professor.as_deref().or(note.professor.as_deref());
        let keywords = search_keywords(
            changes.title.as_deref().unwrap_or(&note.title),
            &note.subject,
            &note.course,
            note.subcourse.as_deref(),
            professor.filter(|p| !p.is_empty()),
            changes.tags.as_deref().unwrap_or(&note.tags),
        );

        let event = ModerationEvent::new(ModerationAction::Edited, Some(actor.user_id));
        let updated = self
            .notes
            .update_details(id, &changes, &keywords, event)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note '{}' not found", id)))?;

        tracing::info!("Note {} edited by {}", id, actor.user_id);
        Ok(updated.into())
    }

    /// Retry relocation for approved notes whose blob is still under the
    /// pending prefix
    pub async fn reconcile_storage(&self, actor: &AuthenticatedUser) -> Result<ReconcileReportDto> {
        policy::require(actor.role, Role::Admin)?;

        let stranded = self
            .notes
            .list_stranded(PENDING_PREFIX, RECONCILE_BATCH)
            .await?;
        let mut report = ReconcileReportDto {
            scanned: stranded.len(),
            ..Default::default()
        };

        for note in stranded {
            match self.store.exists(&note.file.file_key).await {
                Ok(false) => {
                    tracing::warn!(
                        "Approved note {} has no blob at '{}'",
                        note.id,
                        note.file.file_key
                    );
                    report.missing.push(note.id);
                    continue;
                }
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!("Failed to check blob of note {}: {}", note.id, e);
                    report.failed.push(note.id);
                    continue;
                }
            }

            match self.move_to_approved(&note).await {
                Ok(_) => report.relocated.push(note.id),
                Err(e) => {
                    tracing::warn!("Relocation retry failed for note {}: {}", note.id, e);
                    report.failed.push(note.id);
                }
            }
        }

        tracing::info!(
            "Storage reconciliation: {} scanned, {} relocated, {} missing, {} failed",
            report.scanned,
            report.relocated.len(),
            report.missing.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::notes::models::{ModerationAction, NoteStatus};
    use crate::shared::test_helpers::{authenticated, sample_upload, TestContext};
    use tokio_test::assert_ok;

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.7 test".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_blob_under_pending_prefix() {
        let ctx = TestContext::new();
        let uploader = ctx.seed_user(Role::User).await;

        let note = ctx
            .moderation
            .upload(Some(&authenticated(&uploader)), sample_upload(), pdf("Unit1 Notes.pdf"))
            .await
            .unwrap();

        assert_eq!(note.status, NoteStatus::Pending);
        assert_eq!(note.moderation_history.len(), 1);
        assert_eq!(note.moderation_history[0].action, ModerationAction::Uploaded);

        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert!(stored.file.file_key.starts_with("pending/nitk/UG/cse/sem6/os/notes/unit1_notes_"));
        assert!(ctx.store.contains(&stored.file.file_key));
        assert!(stored.file.checksum.is_some());
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_mime_without_storing() {
        let ctx = TestContext::new();
        let file = UploadedFile {
            file_name: "virus.exe".to_string(),
            content_type: "application/x-msdownload".to_string(),
            data: vec![1, 2, 3],
        };

        let result = ctx.moderation.upload(None, sample_upload(), file).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(ctx.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_course_without_usable_characters() {
        let ctx = TestContext::new();
        let mut metadata = sample_upload();
        metadata.course = "++".to_string();

        let result = ctx.moderation.upload(None, metadata, pdf("a.pdf")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(ctx.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_bad_request() {
        let ctx = TestContext::new();
        let file = UploadedFile {
            data: vec![0; 1024 * 1024 + 1],
            ..pdf("big.pdf")
        };

        let result = ctx.moderation.upload(None, sample_upload(), file).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(ctx.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_uploaded_blob() {
        let ctx = TestContext::new();
        ctx.note_repo.fail_inserts(true);

        let result = ctx.moderation.upload(None, sample_upload(), pdf("a.pdf")).await;

        assert!(result.is_err());
        assert!(ctx.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_approve_moves_blob_and_records_history() {
        let ctx = TestContext::new();
        let uploader = ctx.seed_user(Role::User).await;
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(Some(uploader.id)).await;
        let pending_key = note.file.file_key.clone();

        let approved = ctx
            .moderation
            .approve(&authenticated(&moderator), note.id)
            .await
            .unwrap();

        assert_eq!(approved.status, NoteStatus::Approved);
        assert_eq!(approved.approved_by, Some(moderator.id));
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.moderation_history.len(), 2);

        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert!(stored.file.file_key.starts_with("college-notes/"));
        assert_eq!(key_file_name(&stored.file.file_key), key_file_name(&pending_key));
        assert!(ctx.store.contains(&stored.file.file_key));
        assert!(!ctx.store.contains(&pending_key));
        assert_eq!(
            ctx.notification_repo.kinds_for(uploader.id),
            vec![NotificationKind::NoteApproved]
        );
    }

    #[tokio::test]
    async fn test_approve_survives_store_failure() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(None).await;
        ctx.store.fail_copies(true);

        let approved = ctx
            .moderation
            .approve(&authenticated(&moderator), note.id)
            .await
            .unwrap();

        assert_eq!(approved.status, NoteStatus::Approved);
        assert_eq!(approved.moderation_history.len(), 2);
        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored.file.file_key, note.file.file_key);
    }

    #[tokio::test]
    async fn test_second_approval_conflicts() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(None).await;
        let actor = authenticated(&moderator);

        assert_ok!(ctx.moderation.approve(&actor, note.id).await);
        let second = ctx.moderation.approve(&actor, note.id).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_history.0.len(), 2);
    }

    #[tokio::test]
    async fn test_user_cannot_approve() {
        let ctx = TestContext::new();
        let user = ctx.seed_user(Role::User).await;
        let note = ctx.seed_pending_note(None).await;

        let result = ctx.moderation.approve(&authenticated(&user), note.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_leaves_note_unchanged() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(None).await;

        let result = ctx
            .moderation
            .reject(&authenticated(&moderator), note.id, "   ")
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert_eq!(stored.status, NoteStatus::Pending);
        assert_eq!(stored.moderation_history.0.len(), 1);
        assert!(ctx.store.contains(&stored.file.file_key));
    }

    #[tokio::test]
    async fn test_reject_records_reason_and_drops_blob() {
        let ctx = TestContext::new();
        let uploader = ctx.seed_user(Role::User).await;
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(Some(uploader.id)).await;

        let rejected = ctx
            .moderation
            .reject(&authenticated(&moderator), note.id, "Blurry scan")
            .await
            .unwrap();

        assert_eq!(rejected.status, NoteStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Blurry scan"));
        assert_eq!(
            rejected.moderation_history[1].reason.as_deref(),
            Some("Blurry scan")
        );
        assert!(!ctx.store.contains(&note.file.file_key));
        assert_eq!(
            ctx.notification_repo.kinds_for(uploader.id),
            vec![NotificationKind::NoteRejected]
        );
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let ctx = TestContext::new();
        let owner = ctx.seed_user(Role::User).await;
        let note = ctx.seed_pending_note(Some(owner.id)).await;
        let actor = authenticated(&owner);

        assert_ok!(ctx.moderation.delete(&actor, note.id).await);
        let second = ctx.moderation.delete(&actor, note.id).await;

        assert!(matches!(second, Err(AppError::NotFound(_))));
        let stats = ctx.users.recompute(owner.id).await.unwrap();
        assert_eq!(stats.uploads_total, 0);
    }

    #[tokio::test]
    async fn test_moderator_cannot_delete_foreign_note() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(None).await;

        let result = ctx.moderation.delete(&authenticated(&moderator), note.id).await;

        match result {
            Err(AppError::Forbidden(message)) => assert!(message.contains("delete request")),
            other => panic!("expected forbidden, got {:?}", other),
        }
        assert!(ctx.note_repo.find_by_id(note.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_edit_regenerates_keywords_and_appends_history() {
        let ctx = TestContext::new();
        let owner = ctx.seed_user(Role::User).await;
        let note = ctx.seed_pending_note(Some(owner.id)).await;

        let dto = UpdateNoteDto {
            title: Some("Deadlocks Explained".to_string()),
            tags: Some(vec!["Banker".to_string()]),
            ..Default::default()
        };
        let edited = ctx
            .moderation
            .edit(&authenticated(&owner), note.id, dto)
            .await
            .unwrap();

        assert_eq!(edited.title, "Deadlocks Explained");
        assert_eq!(
            edited.moderation_history.last().map(|e| e.action),
            Some(ModerationAction::Edited)
        );
        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        assert!(stored.search_keywords.contains("deadlocks"));
        assert!(stored.search_keywords.contains("banker"));
    }

    #[tokio::test]
    async fn test_auto_approve_for_moderator_uploads() {
        let ctx = TestContext::with_auto_approve(AutoApprovePolicy::Moderators);
        let moderator = ctx.seed_user(Role::Moderator).await;
        let user = ctx.seed_user(Role::User).await;

        let own = ctx
            .moderation
            .upload(Some(&authenticated(&moderator)), sample_upload(), pdf("a.pdf"))
            .await
            .unwrap();
        let other = ctx
            .moderation
            .upload(Some(&authenticated(&user)), sample_upload(), pdf("b.pdf"))
            .await
            .unwrap();

        assert_eq!(own.status, NoteStatus::Approved);
        assert_eq!(own.approved_by, Some(moderator.id));
        assert_eq!(other.status, NoteStatus::Pending);
    }

    #[tokio::test]
    async fn test_reconcile_relocates_stranded_blobs() {
        let ctx = TestContext::new();
        let admin = ctx.seed_user(Role::Admin).await;
        let stranded = ctx.seed_pending_note(None).await;
        let missing = ctx.seed_pending_note(None).await;

        ctx.store.fail_copies(true);
        let actor = authenticated(&admin);
        assert_ok!(ctx.moderation.approve(&actor, stranded.id).await);
        assert_ok!(ctx.moderation.approve(&actor, missing.id).await);
        ctx.store.fail_copies(false);
        assert_ok!(ctx.store.delete(&missing.file.file_key).await);

        let report = ctx.moderation.reconcile_storage(&actor).await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.relocated, vec![stranded.id]);
        assert_eq!(report.missing, vec![missing.id]);
        let stored = ctx.note_repo.find_by_id(stranded.id).await.unwrap().unwrap();
        assert!(stored.file.file_key.starts_with("college-notes/"));
    }
}
