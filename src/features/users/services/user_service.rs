use minijinja::context;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use crate::features::notes::repositories::NoteRepository;
use crate::features::notifications::models::NotificationKind;
use crate::features::notifications::NotificationService;
use crate::features::users::dtos::{UpdateProfileRequestDto, UserQueryParams, UserResponseDto};
use crate::features::users::models::{User, UserFilter, UserStats};
use crate::features::users::repositories::UserRepository;
use crate::shared::types::PaginationQuery;

/// Service for the user directory: profiles, roles, activation and statistics
pub struct UserService {
    users: Arc<dyn UserRepository>,
    notes: Arc<dyn NoteRepository>,
    notifications: Arc<NotificationService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notes: Arc<dyn NoteRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            notes,
            notifications,
        }
    }

    async fn find(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }

    /// Current role of a user, read from the directory
    pub async fn role_of(&self, id: Uuid) -> Result<Role> {
        Ok(self.find(id).await?.role)
    }

    fn ensure_can_view(viewer: &AuthenticatedUser, id: Uuid) -> Result<()> {
        if viewer.can_view_user(id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only view your own account".to_string(),
            ))
        }
    }

    pub async fn get_user(&self, viewer: &AuthenticatedUser, id: Uuid) -> Result<UserResponseDto> {
        Self::ensure_can_view(viewer, id)?;
        Ok(self.find(id).await?.into())
    }

    pub async fn list_users(
        &self,
        actor: &AuthenticatedUser,
        params: UserQueryParams,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<UserResponseDto>, i64)> {
        policy::require(actor.role, Role::SeniorModerator)?;

        let filter = UserFilter {
            role: params.role,
            search: params.search.filter(|s| !s.trim().is_empty()),
        };
        let (users, total) = self
            .users
            .list(&filter, pagination.limit(), pagination.offset())
            .await?;

        Ok((users.into_iter().map(Into::into).collect(), total))
    }

    pub async fn update_profile(
        &self,
        actor: &AuthenticatedUser,
        dto: UpdateProfileRequestDto,
    ) -> Result<UserResponseDto> {
        let name = dto.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let user = self
            .users
            .update_profile(actor.user_id, name, dto.avatar_url.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", actor.user_id)))?;
        Ok(user.into())
    }

    /// Change a user's role under the role-hierarchy rules
    pub async fn change_role(
        &self,
        actor: &AuthenticatedUser,
        target_id: Uuid,
        new_role: Role,
    ) -> Result<UserResponseDto> {
        let target = self.find(target_id).await?;
        policy::ensure_can_change_role(actor.user_id, actor.role, target.id, target.role, new_role)?;

        if target.role == new_role {
            return Ok(target.into());
        }

        let updated = self
            .users
            .update_role(target_id, new_role)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", target_id)))?;

        tracing::info!(
            "User {} role changed {} -> {} by {}",
            target_id,
            target.role,
            new_role,
            actor.user_id
        );

        self.notifications
            .notify(
                target_id,
                NotificationKind::RoleChanged,
                None,
                context! { role => new_role.label() },
            )
            .await;

        Ok(updated.into())
    }

    /// Activate or deactivate an account under the role-hierarchy rules
    pub async fn set_active(
        &self,
        actor: &AuthenticatedUser,
        target_id: Uuid,
        is_active: bool,
    ) -> Result<UserResponseDto> {
        let target = self.find(target_id).await?;
        policy::ensure_can_manage(actor.user_id, actor.role, target.id, target.role)?;

        if target.is_active == is_active {
            return Ok(target.into());
        }

        let updated = self
            .users
            .set_active(target_id, is_active)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", target_id)))?;

        tracing::info!(
            "User {} {} by {}",
            target_id,
            if is_active { "activated" } else { "deactivated" },
            actor.user_id
        );

        self.notifications
            .notify(
                target_id,
                NotificationKind::AccountStatusChanged,
                None,
                context! { active => is_active },
            )
            .await;

        Ok(updated.into())
    }

    pub async fn get_stats(&self, viewer: &AuthenticatedUser, id: Uuid) -> Result<UserStats> {
        Self::ensure_can_view(viewer, id)?;
        Ok(self.find(id).await?.stats)
    }

    pub async fn recompute_for(&self, viewer: &AuthenticatedUser, id: Uuid) -> Result<UserStats> {
        Self::ensure_can_view(viewer, id)?;
        self.recompute(id).await
    }

    /// Rebuild a user's statistics cache by counting notes.
    ///
    /// The only write path of the cache.
    pub async fn recompute(&self, id: Uuid) -> Result<UserStats> {
        let uploads = self.notes.status_counts(Some(id)).await?;
        let moderation = self.notes.moderation_counts(id).await?;

        let stats = UserStats {
            uploads_total: uploads.total(),
            uploads_pending: uploads.pending,
            uploads_approved: uploads.approved,
            uploads_rejected: uploads.rejected,
            moderations_approved: moderation.approved,
            moderations_rejected: moderation.rejected,
            stats_updated_at: None,
        };

        let user = self
            .users
            .save_stats(id, &stats)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))?;

        tracing::debug!("Statistics recomputed for user {}", id);
        Ok(user.stats)
    }

    /// Recompute for every given user, logging failures instead of raising them
    pub async fn refresh_stats(&self, ids: &[Option<Uuid>]) {
        let mut seen: Vec<Uuid> = Vec::new();
        for id in ids.iter().flatten() {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Err(e) = self.recompute(*id).await {
                tracing::warn!("Failed to recompute statistics for user {}: {}", id, e);
            }
        }
    }
}
