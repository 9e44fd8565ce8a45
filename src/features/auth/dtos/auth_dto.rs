use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::UserStats;

/// Request DTO for Google sign-in
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct GoogleLoginRequestDto {
    /// ID token obtained by the client from Google Identity Services
    #[validate(length(min = 1, message = "ID token is required"))]
    pub id_token: String,
}

/// Response DTO for authentication
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    /// Session JWT issued by this service
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    pub user: UserResponseDto,
}

/// DTO for /auth/me response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponseDto {
    #[serde(flatten)]
    pub user: UserResponseDto,
    pub stats: UserStats,
}
