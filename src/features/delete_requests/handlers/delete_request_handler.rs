use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireModerator, RequireSeniorModerator};
use crate::features::delete_requests::dtos::{
    CreateDeleteRequestDto, DeleteRequestQueryParams, DeleteRequestResponseDto,
    ReviewDeleteRequestDto,
};
use crate::features::delete_requests::services::DeleteRequestService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// File a delete request for an approved note
#[utoipa::path(
    post,
    path = "/api/delete-requests",
    request_body = CreateDeleteRequestDto,
    responses(
        (status = 201, description = "Delete request filed", body = ApiResponse<DeleteRequestResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Moderator access required"),
        (status = 404, description = "Note not found"),
        (status = 409, description = "Note not approved or request already pending")
    ),
    tag = "delete-requests",
    security(("bearer_auth" = []))
)]
pub async fn create_delete_request(
    RequireModerator(actor): RequireModerator,
    State(service): State<Arc<DeleteRequestService>>,
    AppJson(dto): AppJson<CreateDeleteRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<DeleteRequestResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.create(&actor, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(request),
            Some("Delete request filed".to_string()),
            None,
        )),
    ))
}

/// Review queue of delete requests
#[utoipa::path(
    get,
    path = "/api/delete-requests",
    params(PaginationQuery, DeleteRequestQueryParams),
    responses(
        (status = 200, description = "Delete requests retrieved", body = ApiResponse<Vec<DeleteRequestResponseDto>>),
        (status = 403, description = "Forbidden - Senior moderator access required")
    ),
    tag = "delete-requests",
    security(("bearer_auth" = []))
)]
pub async fn list_delete_requests(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<DeleteRequestService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<DeleteRequestQueryParams>,
) -> Result<Json<ApiResponse<Vec<DeleteRequestResponseDto>>>> {
    let (items, total) = service.list(&actor, params, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/delete-requests/{id}",
    params(("id" = Uuid, Path, description = "Delete request ID")),
    responses(
        (status = 200, description = "Delete request retrieved", body = ApiResponse<DeleteRequestResponseDto>),
        (status = 403, description = "Forbidden - Moderator access required"),
        (status = 404, description = "Delete request not found")
    ),
    tag = "delete-requests",
    security(("bearer_auth" = []))
)]
pub async fn get_delete_request(
    RequireModerator(actor): RequireModerator,
    State(service): State<Arc<DeleteRequestService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteRequestResponseDto>>> {
    let request = service.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(Some(request), None, None)))
}

/// Approve a delete request and remove the note
#[utoipa::path(
    patch,
    path = "/api/delete-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Delete request ID")),
    request_body = ReviewDeleteRequestDto,
    responses(
        (status = 200, description = "Delete request executed", body = ApiResponse<DeleteRequestResponseDto>),
        (status = 403, description = "Forbidden - Senior moderator access required"),
        (status = 404, description = "Delete request not found"),
        (status = 409, description = "Delete request already reviewed")
    ),
    tag = "delete-requests",
    security(("bearer_auth" = []))
)]
pub async fn approve_delete_request(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<DeleteRequestService>>,
    Path(id): Path<Uuid>,
    dto: Option<AppJson<ReviewDeleteRequestDto>>,
) -> Result<Json<ApiResponse<DeleteRequestResponseDto>>> {
    let dto = dto.map(|AppJson(dto)| dto).unwrap_or_default();
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.approve(&actor, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Delete request approved".to_string()),
        None,
    )))
}

/// Reject a delete request; the note stays
#[utoipa::path(
    patch,
    path = "/api/delete-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Delete request ID")),
    request_body = ReviewDeleteRequestDto,
    responses(
        (status = 200, description = "Delete request rejected", body = ApiResponse<DeleteRequestResponseDto>),
        (status = 400, description = "Reason missing"),
        (status = 403, description = "Forbidden - Senior moderator access required"),
        (status = 404, description = "Delete request not found"),
        (status = 409, description = "Delete request already reviewed")
    ),
    tag = "delete-requests",
    security(("bearer_auth" = []))
)]
pub async fn reject_delete_request(
    RequireSeniorModerator(actor): RequireSeniorModerator,
    State(service): State<Arc<DeleteRequestService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReviewDeleteRequestDto>,
) -> Result<Json<ApiResponse<DeleteRequestResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = service.reject(&actor, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(request),
        Some("Delete request rejected".to_string()),
        None,
    )))
}
