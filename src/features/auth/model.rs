use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::policy::{check_permission, Role};

/// Caller identity attached to the request by the auth middleware.
/// The role is read from the user record on every request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// Role meets or exceeds `required`
    pub fn has_role(&self, required: Role) -> bool {
        check_permission(self.role, required)
    }

    pub fn is_moderator(&self) -> bool {
        self.has_role(Role::Moderator)
    }

    pub fn is_senior_moderator(&self) -> bool {
        self.has_role(Role::SeniorModerator)
    }

    /// Self access, or moderator and above
    pub fn can_view_user(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_moderator()
    }
}

/// Claims of a session token issued by this service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}
