use crate::core::error::Result;
use crate::core::extractor::MaybeUser;
use crate::features::auth::guards::RequireModerator;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notes::dtos::{
    DownloadResponseDto, NoteQueryParams, NoteResponseDto, NoteStatsDto,
};
use crate::features::notes::services::NoteService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Browse notes. Viewers below moderator only see approved notes.
#[utoipa::path(
    get,
    path = "/api/notes",
    params(PaginationQuery, NoteQueryParams),
    responses(
        (status = 200, description = "Notes retrieved", body = ApiResponse<Vec<NoteResponseDto>>)
    ),
    tag = "notes",
    security((), ("bearer_auth" = []))
)]
pub async fn list_notes(
    MaybeUser(viewer): MaybeUser,
    State(service): State<Arc<NoteService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<NoteQueryParams>,
) -> Result<Json<ApiResponse<Vec<NoteResponseDto>>>> {
    let (notes, total) = service.list(viewer.as_ref(), params, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(notes),
        None,
        Some(Meta { total }),
    )))
}

/// List the caller's own uploads in every status
#[utoipa::path(
    get,
    path = "/api/notes/mine",
    params(PaginationQuery, NoteQueryParams),
    responses(
        (status = 200, description = "Own notes retrieved", body = ApiResponse<Vec<NoteResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn my_notes(
    user: AuthenticatedUser,
    State(service): State<Arc<NoteService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<NoteQueryParams>,
) -> Result<Json<ApiResponse<Vec<NoteResponseDto>>>> {
    let (notes, total) = service.mine(&user, params, &pagination).await?;
    Ok(Json(ApiResponse::success(
        Some(notes),
        None,
        Some(Meta { total }),
    )))
}

/// Note counts per moderation status
#[utoipa::path(
    get,
    path = "/api/notes/stats",
    responses(
        (status = 200, description = "Counts retrieved", body = ApiResponse<NoteStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Moderator access required")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn note_stats(
    RequireModerator(actor): RequireModerator,
    State(service): State<Arc<NoteService>>,
) -> Result<Json<ApiResponse<NoteStatsDto>>> {
    let stats = service.stats(&actor).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Get a note with a short-lived download link
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note retrieved", body = ApiResponse<NoteResponseDto>),
        (status = 404, description = "Note not found or not visible")
    ),
    tag = "notes",
    security((), ("bearer_auth" = []))
)]
pub async fn get_note(
    MaybeUser(viewer): MaybeUser,
    State(service): State<Arc<NoteService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NoteResponseDto>>> {
    let note = service.get(viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(Some(note), None, None)))
}

/// Sign a download link and count the download
#[utoipa::path(
    get,
    path = "/api/notes/{id}/download",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Download link created", body = ApiResponse<DownloadResponseDto>),
        (status = 404, description = "Note or file not found"),
        (status = 502, description = "File storage unavailable")
    ),
    tag = "notes",
    security((), ("bearer_auth" = []))
)]
pub async fn download_note(
    MaybeUser(viewer): MaybeUser,
    State(service): State<Arc<NoteService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DownloadResponseDto>>> {
    let link = service.download(viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(Some(link), None, None)))
}
