use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireSeniorModerator;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::moderator_requests::dtos::{
    ApplyModeratorDto, ModeratorRequestQueryParams, ModeratorRequestResponseDto,
    ReviewModeratorRequestDto,
};
use crate::features::moderator_requests::services::ModeratorRequestService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Apply for the moderator role
#[utoipa::path(
    post,
    path = "/api/moderator-requests",
    request_body = ApplyModeratorDto,
    responses(
        (status = 201, description = "Application submitted", body = ApiResponse<ModeratorRequestResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already elevated or application pending")
    ),
    tag = "moderator-requests",
    security(("bearer_auth" = []))
)]
pub async fn apply(
    user: AuthenticatedUser,
    State(service): State<Arc<ModeratorRequestService>>,
    AppJson(dto): AppJson<ApplyModeratorDto>,
) -> Result<(StatusCode, Json<ApiResponse<ModeratorRequestResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.apply(&user, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(request),
            Some("Application submitted".to_string()),
            None,
        )),
    ))
}

/// The caller's latest application
#[utoipa::path(
    get,
    path = "/api/moderator-requests/mine",
    responses(
        (status = 200, description = "Application retrieved", body = ApiResponse<ModeratorRequestResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No application")
    ),
    tag = "moderator-requests",
    security(("bearer_auth" = []))
)]
pub async fn my_request(
    user: AuthenticatedUser,
    State(service): State<Arc<ModeratorRequestService>>,
) -> Result<Json<ApiResponse<ModeratorRequestResponseDto>>> {
    let request = service.mine(&user).await?;
    Ok(Json(ApiResponse::success(Some(request), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/moderator-requests",
    params(PaginationQuery, ModeratorRequestQueryParams),
    responses(
        (status = 200, description = "Applications retrieved", body = ApiResponse<Vec<ModeratorRequestResponseDto>>),
        (status = 403, description = "Forbidden - Senior moderator access required")
    ),
    tag = "moderator-requests",
    security(("bearer_auth" = []))
)]
pub async fn list_requests(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<ModeratorRequestService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<ModeratorRequestQueryParams>,
) -> Result<Json<ApiResponse<Vec<ModeratorRequestResponseDto>>>> {
    let (items, total) = service.list(&actor, params, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Approve an application; the applicant becomes a moderator
#[utoipa::path(
    patch,
    path = "/api/moderator-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Moderator request ID")),
    request_body = ReviewModeratorRequestDto,
    responses(
        (status = 200, description = "Application approved", body = ApiResponse<ModeratorRequestResponseDto>),
        (status = 403, description = "Forbidden - Senior moderator access required"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already reviewed")
    ),
    tag = "moderator-requests",
    security(("bearer_auth" = []))
)]
pub async fn approve_request(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<ModeratorRequestService>>,
    Path(id): Path<Uuid>,
    dto: Option<AppJson<ReviewModeratorRequestDto>>,
) -> Result<Json<ApiResponse<ModeratorRequestResponseDto>>> {
    let dto = dto.map(|AppJson(dto)| dto).unwrap_or_default();
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.approve(&actor, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Application approved".to_string()),
        None,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/moderator-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Moderator request ID")),
    request_body = ReviewModeratorRequestDto,
    responses(
        (status = 200, description = "Application rejected", body = ApiResponse<ModeratorRequestResponseDto>),
        (status = 400, description = "Reason missing"),
        (status = 403, description = "Forbidden - Senior moderator access required"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already reviewed")
    ),
    tag = "moderator-requests",
    security(("bearer_auth" = []))
)]
pub async fn reject_request(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<ModeratorRequestService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReviewModeratorRequestDto>,
) -> Result<Json<ApiResponse<ModeratorRequestResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.reject(&actor, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Application rejected".to_string()),
        None,
    )))
}
