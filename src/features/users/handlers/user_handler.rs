use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSeniorModerator;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{
    ChangeRoleRequestDto, ChangeStatusRequestDto, UpdateProfileRequestDto, UserQueryParams,
    UserResponseDto,
};
use crate::features::users::models::UserStats;
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// List users (senior moderator and above)
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationQuery, UserQueryParams),
    responses(
        (status = 200, description = "Users retrieved", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Senior moderator access required")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<UserService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<UserQueryParams>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let (users, total) = service.list_users(&actor, params, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta { total }),
    )))
}

/// Get a user (self, or moderator and above)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let data = service.get_user(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(data), None, None)))
}

/// Update own display name or avatar
#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileRequestDto,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<UpdateProfileRequestDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let data = service.update_profile(&user, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(data),
        Some("Profile updated".to_string()),
        None,
    )))
}

/// Get a user's cached statistics
#[utoipa::path(
    get,
    path = "/api/users/{id}/stats",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Statistics retrieved", body = ApiResponse<UserStats>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserStats>>> {
    let stats = service.get_stats(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Rebuild a user's statistics by counting notes
#[utoipa::path(
    post,
    path = "/api/users/{id}/stats/recompute",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Statistics recomputed", body = ApiResponse<UserStats>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn recompute_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserStats>>> {
    let stats = service.recompute_for(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Change a user's role
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeRoleRequestDto,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Target or role above your level"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ChangeRoleRequestDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let data = service.change_role(&user, id, dto.role).await?;
    Ok(Json(ApiResponse::success(
        Some(data),
        Some("Role updated".to_string()),
        None,
    )))
}

/// Activate or deactivate a user
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeStatusRequestDto,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Target above your level"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn change_status(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ChangeStatusRequestDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let data = service.set_active(&user, id, dto.is_active).await?;
    Ok(Json(ApiResponse::success(
        Some(data),
        Some("Status updated".to_string()),
        None,
    )))
}
