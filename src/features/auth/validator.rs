use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;
use crate::core::error::AppError;
use crate::features::users::models::GoogleProfile;

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Verifies a third-party identity token and returns the asserted profile
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile, AppError>;
}

/// Validates Google ID tokens against Google's published signing keys
pub struct GoogleTokenValidator {
    jwks_client: Arc<JwksClient>,
    client_id: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct GoogleClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<EmailVerified>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Google has sent this claim both as a boolean and as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmailVerified {
    Bool(bool),
    Text(String),
}

impl EmailVerified {
    fn is_true(&self) -> bool {
        match self {
            EmailVerified::Bool(b) => *b,
            EmailVerified::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

impl GoogleTokenValidator {
    pub fn new(jwks_client: Arc<JwksClient>, client_id: String, leeway: Duration) -> Self {
        Self {
            jwks_client,
            client_id,
            leeway: leeway.as_secs(),
        }
    }
}

fn profile_from_claims(claims: GoogleClaims) -> Result<GoogleProfile, AppError> {
    let email = claims
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Auth("Token carries no email address".to_string()))?;

    if !claims.email_verified.is_some_and(|v| v.is_true()) {
        return Err(AppError::Auth("Email address is not verified".to_string()));
    }

    let name = claims
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Ok(GoogleProfile {
        sub: claims.sub,
        email,
        name,
        avatar_url: claims.picture,
    })
}

#[async_trait]
impl IdentityVerifier for GoogleTokenValidator {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile, AppError> {
        let header = decode_header(id_token).map_err(|e| AppError::Auth(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[&self.client_id]);
        validation.leeway = self.leeway;

        let token_data = decode::<GoogleClaims>(id_token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        profile_from_claims(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email_verified: Option<EmailVerified>, name: Option<&str>) -> GoogleClaims {
        GoogleClaims {
            sub: "1234567890".to_string(),
            email: Some("Asha.K@NITK.edu.in".to_string()),
            email_verified,
            name: name.map(str::to_string),
            picture: None,
        }
    }

    #[test]
    fn test_profile_lowercases_email_and_falls_back_to_local_part() {
        let profile = profile_from_claims(claims(Some(EmailVerified::Bool(true)), None)).unwrap();
        assert_eq!(profile.email, "asha.k@nitk.edu.in");
        assert_eq!(profile.name, "asha.k");
    }

    #[test]
    fn test_string_email_verified_is_accepted() {
        let profile = profile_from_claims(claims(
            Some(EmailVerified::Text("true".to_string())),
            Some("Asha"),
        ))
        .unwrap();
        assert_eq!(profile.name, "Asha");
    }

    #[test]
    fn test_unverified_email_is_rejected() {
        let result = profile_from_claims(claims(Some(EmailVerified::Bool(false)), None));
        assert!(matches!(result, Err(AppError::Auth(_))));

        let result = profile_from_claims(claims(None, None));
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_garbage_token_is_auth_error() {
        let validator = GoogleTokenValidator::new(
            Arc::new(JwksClient::new("http://127.0.0.1:9/certs", Duration::from_secs(60))),
            "client-id".to_string(),
            Duration::from_secs(0),
        );
        let result = validator.verify("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }
}
