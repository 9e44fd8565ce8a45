use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, GoogleLoginRequestDto, MeResponseDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::session::SessionTokens;
use crate::features::auth::validator::IdentityVerifier;
use crate::features::users::repositories::UserRepository;

/// Service for authentication operations (Google sign-in, current user)
pub struct AuthService {
    verifier: Arc<dyn IdentityVerifier>,
    tokens: Arc<SessionTokens>,
    users: Arc<dyn UserRepository>,
    admin_emails: Vec<String>,
}

impl AuthService {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        tokens: Arc<SessionTokens>,
        users: Arc<dyn UserRepository>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            verifier,
            tokens,
            users,
            admin_emails,
        }
    }

    /// Exchange a Google ID token for a session token.
    ///
    /// Creates the account on first sign-in. Emails listed in `ADMIN_EMAILS`
    /// are granted the admin role.
    pub async fn login_with_google(&self, dto: GoogleLoginRequestDto) -> Result<AuthResponseDto> {
        let profile = self.verifier.verify(&dto.id_token).await?;

        let promote_admin = self
            .admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&profile.email));

        let user = self.users.upsert_google(&profile, promote_admin).await?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        let issued = self.tokens.issue(&user)?;

        tracing::info!("User {} signed in ({})", user.id, user.role);

        Ok(AuthResponseDto {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }

    /// Get current user info (for /me endpoint)
    pub async fn get_current_user(&self, user: AuthenticatedUser) -> Result<MeResponseDto> {
        let record = self
            .users
            .find_by_id(user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", user.user_id)))?;

        let stats = record.stats.clone();
        Ok(MeResponseDto {
            user: record.into(),
            stats,
        })
    }
}
