use minijinja::context;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use crate::features::delete_requests::dtos::{
    CreateDeleteRequestDto, DeleteRequestQueryParams, DeleteRequestResponseDto,
    ReviewDeleteRequestDto,
};
use crate::features::delete_requests::models::{
    DeleteRequest, DeleteRequestStatus, NewDeleteRequest,
};
use crate::features::delete_requests::repositories::DeleteRequestRepository;
use crate::features::notes::models::{ModerationAction, ModerationEvent, NoteStatus};
use crate::features::notes::repositories::NoteRepository;
use crate::features::notes::ModerationService;
use crate::features::notifications::models::NotificationKind;
use crate::features::notifications::NotificationService;
use crate::shared::types::PaginationQuery;

/// Moderator proposals to remove approved notes, reviewed by senior moderators
pub struct DeleteRequestService {
    requests: Arc<dyn DeleteRequestRepository>,
    notes: Arc<dyn NoteRepository>,
    moderation: Arc<ModerationService>,
    notifications: Arc<NotificationService>,
}

impl DeleteRequestService {
    pub fn new(
        requests: Arc<dyn DeleteRequestRepository>,
        notes: Arc<dyn NoteRepository>,
        moderation: Arc<ModerationService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            requests,
            notes,
            moderation,
            notifications,
        }
    }

    async fn find(&self, id: Uuid) -> Result<DeleteRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Delete request '{}' not found", id)))
    }

    /// Error for a review that found the request no longer pending
    async fn already_reviewed(&self, id: Uuid) -> AppError {
        match self.find(id).await {
            Ok(request) => AppError::Conflict(format!(
                "Delete request '{}' is already {}",
                id, request.status
            )),
            Err(e) => e,
        }
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        dto: CreateDeleteRequestDto,
    ) -> Result<DeleteRequestResponseDto> {
        policy::require(actor.role, Role::Moderator)?;

        let reason = dto.reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("A reason is required".to_string()));
        }

        let note = self
            .notes
            .find_by_id(dto.note_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note '{}' not found", dto.note_id)))?;
        if note.status != NoteStatus::Approved {
            return Err(AppError::Conflict(format!(
                "Only approved notes can be requested for deletion (note is {})",
                note.status
            )));
        }

        let request = self
            .requests
            .insert(NewDeleteRequest {
                note_id: note.id,
                note_title: note.title.clone(),
                requested_by: actor.user_id,
                reason: reason.to_string(),
            })
            .await?;

        let event = ModerationEvent::new(ModerationAction::DeleteRequested, Some(actor.user_id))
            .with_reason(reason);
        if let Err(e) = self.notes.append_history(note.id, event).await {
            tracing::warn!(
                "Failed to record delete request {} on note {}: {}",
                request.id,
                note.id,
                e
            );
        }

        tracing::info!(
            "Delete request {} filed for note {} by {}",
            request.id,
            note.id,
            actor.user_id
        );
        Ok(request.into())
    }

    pub async fn list(
        &self,
        actor: &AuthenticatedUser,
        params: DeleteRequestQueryParams,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<DeleteRequestResponseDto>, i64)> {
        policy::require(actor.role, Role::SeniorModerator)?;

        let (items, total) = self
            .requests
            .list(params.status, pagination.limit(), pagination.offset())
            .await?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    pub async fn get(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<DeleteRequestResponseDto> {
        policy::require(actor.role, Role::Moderator)?;
        Ok(self.find(id).await?.into())
    }

    /// Approve and carry out the deletion. A note that is already gone still
    /// leaves the request `executed`. A request stuck in `approved` after a
    /// failed deletion is resumed by approving it again.
    pub async fn approve(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: ReviewDeleteRequestDto,
    ) -> Result<DeleteRequestResponseDto> {
        policy::require(actor.role, Role::SeniorModerator)?;
        let review_reason = dto.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

        let request = match self
            .requests
            .mark_reviewed(id, DeleteRequestStatus::Approved, actor.user_id, review_reason)
            .await?
        {
            Some(request) => request,
            None => {
                let existing = self.find(id).await?;
                if existing.status != DeleteRequestStatus::Approved {
                    return Err(AppError::Conflict(format!(
                        "Delete request '{}' is already {}",
                        id, existing.status
                    )));
                }
                tracing::info!("Resuming approved delete request {}", id);
                existing
            }
        };

        if let Some(note_id) = request.note_id {
            match self.notes.find_by_id(note_id).await? {
                Some(note) => {
                    self.moderation
                        .purge(&note, Some(actor.user_id), Some(&request.reason))
                        .await?;
                }
                None => tracing::debug!("Note {} already gone for delete request {}", note_id, id),
            }
        }

        let executed = self
            .requests
            .mark_executed(id)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Delete request '{}' changed concurrently", id)))?;

        tracing::info!("Delete request {} executed by {}", id, actor.user_id);

        self.notifications
            .notify(
                executed.requested_by,
                NotificationKind::DeleteRequestResolved,
                None,
                context! {
                    note_title => &executed.note_title,
                    outcome => "approved",
                    reason => review_reason,
                },
            )
            .await;

        Ok(executed.into())
    }

    pub async fn reject(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: ReviewDeleteRequestDto,
    ) -> Result<DeleteRequestResponseDto> {
        policy::require(actor.role, Role::SeniorModerator)?;

        let reason = dto
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::Validation("A rejection reason is required".to_string()))?;

        let request = match self
            .requests
            .mark_reviewed(id, DeleteRequestStatus::Rejected, actor.user_id, Some(reason))
            .await?
        {
            Some(request) => request,
            None => return Err(self.already_reviewed(id).await),
        };

        if let Some(note_id) = request.note_id {
            let event = ModerationEvent::new(
                ModerationAction::DeleteRequestRejected,
                Some(actor.user_id),
            )
            .with_reason(reason);
            if let Err(e) = self.notes.append_history(note_id, event).await {
                tracing::warn!("Failed to record rejection on note {}: {}", note_id, e);
            }
        }

        tracing::info!("Delete request {} rejected by {}", id, actor.user_id);

        self.notifications
            .notify(
                request.requested_by,
                NotificationKind::DeleteRequestResolved,
                request.note_id,
                context! {
                    note_title => &request.note_title,
                    outcome => "rejected",
                    reason => reason,
                },
            )
            .await;

        Ok(request.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{authenticated, TestContext};

    fn request_for(note_id: Uuid) -> CreateDeleteRequestDto {
        CreateDeleteRequestDto {
            note_id,
            reason: "Copyrighted textbook scan".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_pending_request_conflicts() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let other = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_approved_note(None).await;

        let first = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();
        assert_eq!(first.status, DeleteRequestStatus::Pending);

        let second = ctx
            .delete_requests
            .create(&authenticated(&other), request_for(note.id))
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        let last = stored.moderation_history.0.last().map(|e| e.action);
        assert_eq!(last, Some(ModerationAction::DeleteRequested));
    }

    #[tokio::test]
    async fn test_pending_note_cannot_be_requested() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_pending_note(None).await;

        let result = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approval_deletes_note_and_executes() {
        let ctx = TestContext::new();
        let uploader = ctx.seed_user(Role::User).await;
        let moderator = ctx.seed_user(Role::Moderator).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let note = ctx.seed_approved_note(Some(uploader.id)).await;

        let request = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();
        let executed = ctx
            .delete_requests
            .approve(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await
            .unwrap();

        assert_eq!(executed.status, DeleteRequestStatus::Executed);
        assert!(executed.executed_at.is_some());
        assert!(ctx.note_repo.find_by_id(note.id).await.unwrap().is_none());
        assert!(ctx
            .notification_repo
            .kinds_for(uploader.id)
            .contains(&NotificationKind::NoteDeleted));
        assert_eq!(
            ctx.notification_repo.kinds_for(moderator.id),
            vec![NotificationKind::DeleteRequestResolved]
        );

        let again = ctx
            .delete_requests
            .approve(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_deletion_can_be_approved_again() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let note = ctx.seed_approved_note(None).await;
        let request = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();

        ctx.note_repo.fail_deletes(true);
        let failed = ctx
            .delete_requests
            .approve(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await;
        assert!(failed.is_err());
        assert!(ctx.note_repo.find_by_id(note.id).await.unwrap().is_some());

        ctx.note_repo.fail_deletes(false);
        let executed = ctx
            .delete_requests
            .approve(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await
            .unwrap();
        assert_eq!(executed.status, DeleteRequestStatus::Executed);
        assert!(ctx.note_repo.find_by_id(note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approval_of_vanished_note_still_executes() {
        let ctx = TestContext::new();
        let owner = ctx.seed_user(Role::User).await;
        let moderator = ctx.seed_user(Role::Moderator).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let note = ctx.seed_approved_note(Some(owner.id)).await;

        let request = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();
        ctx.moderation
            .delete(&authenticated(&owner), note.id)
            .await
            .unwrap();

        let executed = ctx
            .delete_requests
            .approve(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await
            .unwrap();
        assert_eq!(executed.status, DeleteRequestStatus::Executed);
    }

    #[tokio::test]
    async fn test_rejection_keeps_note_and_requires_reason() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let note = ctx.seed_approved_note(None).await;
        let request = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();

        let missing_reason = ctx
            .delete_requests
            .reject(&authenticated(&senior), request.id, ReviewDeleteRequestDto::default())
            .await;
        assert!(matches!(missing_reason, Err(AppError::Validation(_))));

        let rejected = ctx
            .delete_requests
            .reject(
                &authenticated(&senior),
                request.id,
                ReviewDeleteRequestDto {
                    reason: Some("Scan is original work".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(rejected.status, DeleteRequestStatus::Rejected);
        let stored = ctx.note_repo.find_by_id(note.id).await.unwrap().unwrap();
        let last = stored.moderation_history.0.last().map(|e| e.action);
        assert_eq!(last, Some(ModerationAction::DeleteRequestRejected));
    }

    #[tokio::test]
    async fn test_moderator_cannot_review() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;
        let note = ctx.seed_approved_note(None).await;
        let request = ctx
            .delete_requests
            .create(&authenticated(&moderator), request_for(note.id))
            .await
            .unwrap();

        let result = ctx
            .delete_requests
            .approve(&authenticated(&moderator), request.id, ReviewDeleteRequestDto::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
