use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::policy::Role;

/// Cached per-user counters.
///
/// Only ever written by `UserService::recompute`, which counts notes from
/// scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserStats {
    pub uploads_total: i64,
    pub uploads_pending: i64,
    pub uploads_approved: i64,
    pub uploads_rejected: i64,
    pub moderations_approved: i64,
    pub moderations_rejected: i64,
    pub stats_updated_at: Option<DateTime<Utc>>,
}

/// Database model for user
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub google_sub: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[sqlx(flatten)]
    pub stats: UserStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Identity asserted by the sign-in provider
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Filters for the user directory listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive match on email or name
    pub search: Option<String>,
}
