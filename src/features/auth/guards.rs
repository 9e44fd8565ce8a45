//! Role-based authorization guards.
//!
//! These guards extract the authenticated user and verify the role meets a
//! minimum level. Each role includes all permissions of the roles below it:
//! admin > senior_moderator > moderator > user.
//!
//! Missing authentication is rejected with 401, an insufficient role with 403.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use axum::{extract::FromRequestParts, http::request::Parts};

fn authorize(parts: &Parts, required: Role) -> Result<AuthenticatedUser, AppError> {
    let user = parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    policy::require(user.role, required)?;

    Ok(user.clone())
}

/// Guard for moderator level access.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireModerator(user): RequireModerator) { ... }
/// ```
pub struct RequireModerator(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireModerator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Role::Moderator).map(RequireModerator)
    }
}

/// Guard for senior moderator level access.
///
/// Use this for delete-request review, moderator applications and the user
/// directory.
pub struct RequireSeniorModerator(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireSeniorModerator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Role::SeniorModerator).map(RequireSeniorModerator)
    }
}

/// Guard for admin access
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorize(parts, Role::Admin).map(RequireAdmin)
    }
}
