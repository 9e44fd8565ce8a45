use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::db_error;
use crate::core::error::Result;
use crate::features::auth::policy::Role;
use crate::features::users::models::{GoogleProfile, User, UserFilter, UserStats};
use crate::shared::validation::contains_pattern;

const USER_COLUMNS: &str = r#"
    id, email, name, avatar_url, google_sub, role, is_active,
    uploads_total, uploads_pending, uploads_approved, uploads_rejected,
    moderations_approved, moderations_rejected, stats_updated_at,
    created_at, updated_at, last_login_at
"#;

/// Persistence for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert on first sign-in, afterwards only fill in missing profile
    /// fields. `promote_admin` forces the admin role.
    async fn upsert_google(&self, profile: &GoogleProfile, promote_admin: bool) -> Result<User>;

    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> Result<(Vec<User>, i64)>;

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>>;

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>>;

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>>;

    async fn save_stats(&self, id: Uuid, stats: &UserStats) -> Result<Option<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get user by ID"))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = LOWER($1)",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get user by email"))
    }

    async fn upsert_google(&self, profile: &GoogleProfile, promote_admin: bool) -> Result<User> {
        let initial_role = if promote_admin { Role::Admin } else { Role::User };
        let sql = format!(
            r#"
            INSERT INTO users (id, email, name, avatar_url, google_sub, role, last_login_at)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, NOW())
            ON CONFLICT (email) DO UPDATE SET
                name = COALESCE(NULLIF(users.name, ''), EXCLUDED.name),
                avatar_url = COALESCE(users.avatar_url, EXCLUDED.avatar_url),
                google_sub = EXCLUDED.google_sub,
                role = CASE WHEN $7 THEN 'admin'::user_role ELSE users.role END,
                last_login_at = NOW(),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::now_v7())
            .bind(&profile.email)
            .bind(&profile.name)
            .bind(&profile.avatar_url)
            .bind(&profile.sub)
            .bind(initial_role)
            .bind(promote_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to upsert user"))
    }

    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let pattern = filter
            .search
            .as_ref()
            .map(|s| contains_pattern(s.trim()));

        let where_clause = r#"
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::text IS NULL OR email ILIKE $2 ESCAPE '\' OR name ILIKE $2 ESCAPE '\')
        "#;

        let sql = format!(
            "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            USER_COLUMNS, where_clause
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(filter.role)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list users"))?;

        let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.role)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count users"))?;

        Ok((users, total))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                avatar_url = COALESCE($3, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update user profile"))
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update user role"))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update user status"))
    }

    async fn save_stats(&self, id: Uuid, stats: &UserStats) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                uploads_total = $2,
                uploads_pending = $3,
                uploads_approved = $4,
                uploads_rejected = $5,
                moderations_approved = $6,
                moderations_rejected = $7,
                stats_updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(stats.uploads_total)
            .bind(stats.uploads_pending)
            .bind(stats.uploads_approved)
            .bind(stats.uploads_rejected)
            .bind(stats.moderations_approved)
            .bind(stats.moderations_rejected)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to save user stats"))
    }
}
