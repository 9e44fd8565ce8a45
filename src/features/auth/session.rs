use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;

/// Issues and validates the HS256 session tokens handed out after sign-in
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
    leeway: u64,
}

/// A freshly issued session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

impl SessionTokens {
    pub fn new(secret: &str, issuer: &str, ttl: Duration, leeway: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl,
            leeway: leeway.as_secs(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_issuer,
            config.token_ttl,
            config.jwt_leeway,
        )
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.ttl.as_secs() as i64,
        })
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;
        validation.leeway = self.leeway;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Auth(e.to_string()))
    }
}

/// Resolves a bearer token to the current user record.
///
/// The role and activation flag come from the database, so role changes and
/// deactivation take effect on the next request.
pub struct SessionAuthenticator {
    tokens: Arc<SessionTokens>,
    users: Arc<dyn UserRepository>,
}

impl SessionAuthenticator {
    pub fn new(tokens: Arc<SessionTokens>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.tokens.validate(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Malformed subject claim".to_string()))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::policy::Role;
    use crate::shared::test_helpers::{sample_user, InMemoryUserRepository};

    const SECRET: &str = "an-hmac-secret-that-is-long-enough-for-tests";

    fn tokens() -> SessionTokens {
        SessionTokens::new(
            SECRET,
            "college-notes-core",
            Duration::from_secs(3600),
            Duration::from_secs(0),
        )
    }

    #[test]
    fn test_issue_then_validate() {
        let user = sample_user(Role::Moderator);
        let issued = tokens().issue(&user).unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = tokens().validate(&issued.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, Role::Moderator);
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let other = SessionTokens::new(
            SECRET,
            "someone-else",
            Duration::from_secs(3600),
            Duration::from_secs(0),
        );
        let issued = other.issue(&sample_user(Role::User)).unwrap();
        assert!(matches!(
            tokens().validate(&issued.access_token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let short = SessionTokens::new(
            SECRET,
            "college-notes-core",
            Duration::from_secs(0),
            Duration::from_secs(0),
        );
        let issued = short.issue(&sample_user(Role::User)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(matches!(
            short.validate(&issued.access_token),
            Err(AppError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticator_uses_current_role_and_rejects_inactive() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let mut user = sample_user(Role::User);
        repo.put(user.clone());

        let tokens = Arc::new(tokens());
        let issued = tokens.issue(&user).unwrap();
        let authenticator = SessionAuthenticator::new(tokens, repo.clone());

        // promoted after the token was issued
        user.role = Role::Moderator;
        repo.put(user.clone());
        let authed = authenticator.authenticate(&issued.access_token).await.unwrap();
        assert_eq!(authed.role, Role::Moderator);

        user.is_active = false;
        repo.put(user);
        let result = authenticator.authenticate(&issued.access_token).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
