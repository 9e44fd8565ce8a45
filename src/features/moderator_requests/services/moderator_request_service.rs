use minijinja::context;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use crate::features::moderator_requests::dtos::{
    ApplyModeratorDto, ModeratorRequestQueryParams, ModeratorRequestResponseDto,
    ReviewModeratorRequestDto,
};
use crate::features::moderator_requests::models::{ModeratorRequest, ModeratorRequestStatus};
use crate::features::moderator_requests::repositories::ModeratorRequestRepository;
use crate::features::notifications::models::NotificationKind;
use crate::features::notifications::NotificationService;
use crate::features::users::UserService;
use crate::shared::types::PaginationQuery;

/// Applications for the moderator role
pub struct ModeratorRequestService {
    requests: Arc<dyn ModeratorRequestRepository>,
    users: Arc<UserService>,
    notifications: Arc<NotificationService>,
}

impl ModeratorRequestService {
    pub fn new(
        requests: Arc<dyn ModeratorRequestRepository>,
        users: Arc<UserService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            requests,
            users,
            notifications,
        }
    }

    async fn already_reviewed(&self, id: Uuid) -> AppError {
        match self.requests.find_by_id(id).await {
            Ok(Some(request)) => AppError::Conflict(format!(
                "Moderator request '{}' is already {}",
                id,
                request.status.as_str()
            )),
            Ok(None) => AppError::NotFound(format!("Moderator request '{}' not found", id)),
            Err(e) => e,
        }
    }

    async fn notify_outcome(&self, request: &ModeratorRequest, reason: Option<&str>) {
        self.notifications
            .notify(
                request.user_id,
                NotificationKind::ModeratorRequestResolved,
                None,
                context! { outcome => request.status.as_str(), reason => reason },
            )
            .await;
    }

    pub async fn apply(
        &self,
        user: &AuthenticatedUser,
        dto: ApplyModeratorDto,
    ) -> Result<ModeratorRequestResponseDto> {
        if user.role != Role::User {
            return Err(AppError::Conflict(format!(
                "You already hold the {} role",
                user.role.label()
            )));
        }

        let request = self
            .requests
            .insert(user.user_id, dto.motivation.trim())
            .await?;

        tracing::info!("Moderator application {} from {}", request.id, user.user_id);
        Ok(request.into())
    }

    /// The caller's latest application
    pub async fn mine(&self, user: &AuthenticatedUser) -> Result<ModeratorRequestResponseDto> {
        self.requests
            .latest_for_user(user.user_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("No moderator application found".to_string()))
    }

    pub async fn list(
        &self,
        actor: &AuthenticatedUser,
        params: ModeratorRequestQueryParams,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ModeratorRequestResponseDto>, i64)> {
        policy::require(actor.role, Role::SeniorModerator)?;

        let (items, total) = self
            .requests
            .list(params.status, pagination.limit(), pagination.offset())
            .await?;
        Ok((items.into_iter().map(Into::into).collect(), total))
    }

    /// Approve an application and promote the applicant to moderator.
    /// The request only becomes `approved` once the promotion succeeded.
    pub async fn approve(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: ReviewModeratorRequestDto,
    ) -> Result<ModeratorRequestResponseDto> {
        policy::require(actor.role, Role::SeniorModerator)?;
        let reason = dto.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

        let pending = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Moderator request '{}' not found", id)))?;
        if pending.status != ModeratorRequestStatus::Pending {
            return Err(self.already_reviewed(id).await);
        }

        let current = self.users.role_of(pending.user_id).await?;
        if current != Role::User {
            return Err(AppError::Conflict(format!(
                "Applicant already holds the {} role",
                current.label()
            )));
        }

        self.users
            .change_role(actor, pending.user_id, Role::Moderator)
            .await?;

        let request = match self
            .requests
            .mark_reviewed(id, ModeratorRequestStatus::Approved, actor.user_id, reason)
            .await?
        {
            Some(request) => request,
            None => return Err(self.already_reviewed(id).await),
        };

        tracing::info!(
            "Moderator application {} approved by {}",
            id,
            actor.user_id
        );
        self.notify_outcome(&request, reason).await;
        Ok(request.into())
    }

    pub async fn reject(
        &self,
        actor: &AuthenticatedUser,
        id: Uuid,
        dto: ReviewModeratorRequestDto,
    ) -> Result<ModeratorRequestResponseDto> {
        policy::require(actor.role, Role::SeniorModerator)?;
        let reason = dto
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::Validation("A rejection reason is required".to_string()))?;

        let request = match self
            .requests
            .mark_reviewed(id, ModeratorRequestStatus::Rejected, actor.user_id, Some(reason))
            .await?
        {
            Some(request) => request,
            None => return Err(self.already_reviewed(id).await),
        };

        tracing::info!(
            "Moderator application {} rejected by {}",
            id,
            actor.user_id
        );
        self.notify_outcome(&request, Some(reason)).await;
        Ok(request.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::repositories::UserRepository;
    use crate::shared::test_helpers::{authenticated, TestContext};
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn application() -> ApplyModeratorDto {
        ApplyModeratorDto {
            motivation: Sentence(8..12).fake(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_pending_application_conflicts() {
        let ctx = TestContext::new();
        let user = ctx.seed_user(Role::User).await;
        let actor = authenticated(&user);

        let first = ctx.moderator_requests.apply(&actor, application()).await.unwrap();
        assert_eq!(first.status, ModeratorRequestStatus::Pending);

        let second = ctx.moderator_requests.apply(&actor, application()).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_moderator_cannot_apply() {
        let ctx = TestContext::new();
        let moderator = ctx.seed_user(Role::Moderator).await;

        let result = ctx
            .moderator_requests
            .apply(&authenticated(&moderator), application())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approval_promotes_applicant() {
        let ctx = TestContext::new();
        let user = ctx.seed_user(Role::User).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let request = ctx
            .moderator_requests
            .apply(&authenticated(&user), application())
            .await
            .unwrap();

        let approved = ctx
            .moderator_requests
            .approve(
                &authenticated(&senior),
                request.id,
                ReviewModeratorRequestDto::default(),
            )
            .await
            .unwrap();

        assert_eq!(approved.status, ModeratorRequestStatus::Approved);
        let promoted = ctx.user_repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(promoted.role, Role::Moderator);
        assert_eq!(
            ctx.notification_repo.kinds_for(user.id),
            vec![
                NotificationKind::RoleChanged,
                NotificationKind::ModeratorRequestResolved
            ]
        );

        let mine = ctx.moderator_requests.mine(&authenticated(&user)).await.unwrap();
        assert_eq!(mine.id, request.id);
    }

    #[tokio::test]
    async fn test_stale_application_keeps_higher_role() {
        let ctx = TestContext::new();
        let user = ctx.seed_user(Role::User).await;
        let admin = ctx.seed_user(Role::Admin).await;
        let request = ctx
            .moderator_requests
            .apply(&authenticated(&user), application())
            .await
            .unwrap();

        ctx.users
            .change_role(&authenticated(&admin), user.id, Role::SeniorModerator)
            .await
            .unwrap();

        let result = ctx
            .moderator_requests
            .approve(
                &authenticated(&admin),
                request.id,
                ReviewModeratorRequestDto::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = ctx.user_repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::SeniorModerator);
        let mine = ctx.moderator_requests.mine(&authenticated(&user)).await.unwrap();
        assert_eq!(mine.status, ModeratorRequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejection_needs_reason_and_allows_reapplying() {
        let ctx = TestContext::new();
        let user = ctx.seed_user(Role::User).await;
        let senior = ctx.seed_user(Role::SeniorModerator).await;
        let actor = authenticated(&user);
        let request = ctx.moderator_requests.apply(&actor, application()).await.unwrap();

        let missing = ctx
            .moderator_requests
            .reject(
                &authenticated(&senior),
                request.id,
                ReviewModeratorRequestDto::default(),
            )
            .await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let rejected = ctx
            .moderator_requests
            .reject(
                &authenticated(&senior),
                request.id,
                ReviewModeratorRequestDto {
                    reason: Some("Too new to the platform".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, ModeratorRequestStatus::Rejected);

        assert!(ctx.moderator_requests.apply(&actor, application()).await.is_ok());
    }
}
