//! Role hierarchy and the permission rules built on it.
//!
//! Roles form a total order:
//!
//! | Role | Level |
//! |------|-------|
//! | `user` | 0 |
//! | `moderator` | 1 |
//! | `senior_moderator` | 2 |
//! | `admin` | 3 |
//!
//! An actor may manage (change role or activation of) only users strictly
//! below its own level, and may never hand out a role above its own level.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Moderator,
    SeniorModerator,
    Admin,
}

impl Role {
    pub fn level(self) -> u8 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::SeniorModerator => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::SeniorModerator => "senior_moderator",
            Role::Admin => "admin",
        }
    }

    /// Human-readable label used in notification texts
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Moderator => "Moderator",
            Role::SeniorModerator => "Senior Moderator",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `actor` meets or exceeds `required`
pub fn check_permission(actor: Role, required: Role) -> bool {
    actor.level() >= required.level()
}

/// `actor` sits strictly above `target`
pub fn can_manage(actor: Role, target: Role) -> bool {
    target.level() < actor.level()
}

/// `actor` may hand out `role`
pub fn can_assign(actor: Role, role: Role) -> bool {
    role.level() <= actor.level()
}

/// Reject with a permission error unless `actor` meets `required`
pub fn require(actor: Role, required: Role) -> Result<()> {
    if check_permission(actor, required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} access required",
            required.label()
        )))
    }
}

/// Validate a role change of `target_id` from `current` to `new_role`
pub fn ensure_can_change_role(
    actor_id: Uuid,
    actor_role: Role,
    target_id: Uuid,
    current: Role,
    new_role: Role,
) -> Result<()> {
    if actor_id == target_id {
        return Err(AppError::Forbidden(
            "You cannot change your own role".to_string(),
        ));
    }
    if !can_manage(actor_role, current) {
        return Err(AppError::Forbidden(
            "You can only manage users below your own role".to_string(),
        ));
    }
    if !can_assign(actor_role, new_role) {
        return Err(AppError::Forbidden(format!(
            "You cannot assign the {} role",
            new_role.label()
        )));
    }
    Ok(())
}

/// Validate an activation change of `target_id`
pub fn ensure_can_manage(
    actor_id: Uuid,
    actor_role: Role,
    target_id: Uuid,
    target_role: Role,
) -> Result<()> {
    if actor_id == target_id {
        return Err(AppError::Forbidden(
            "You cannot change your own account status".to_string(),
        ));
    }
    if !can_manage(actor_role, target_role) {
        return Err(AppError::Forbidden(
            "You can only manage users below your own role".to_string(),
        ));
    }
    Ok(())
}
