use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, MaybeUser};
use crate::features::auth::guards::RequireModerator;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notes::dtos::{
    NoteResponseDto, RejectNoteDto, UpdateNoteDto, UploadNoteDto, UploadNoteForm, UploadedFile,
};
use crate::features::notes::models::{ProgramLevel, UploadType};
use crate::features::notes::services::ModerationService;
use crate::shared::types::ApiResponse;

async fn read_text(field: Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(AppError::Validation)
}

/// Upload a note (guests allowed)
///
/// Accepts multipart/form-data with the document in `file` and the
/// descriptive fields as text parts. The note enters the moderation queue
/// unless auto-approval applies to the uploader.
#[utoipa::path(
    post,
    path = "/api/notes/upload",
    request_body(
        content = UploadNoteForm,
        content_type = "multipart/form-data",
        description = "Document plus catalogue metadata",
    ),
    responses(
        (status = 201, description = "Note uploaded", body = ApiResponse<NoteResponseDto>),
        (status = 400, description = "Invalid file or metadata, or file too large"),
        (status = 502, description = "File storage unavailable")
    ),
    tag = "notes",
    security((), ("bearer_auth" = []))
)]
pub async fn upload_note(
    MaybeUser(uploader): MaybeUser,
    State(service): State<Arc<ModerationService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<NoteResponseDto>>)> {
    let mut file: Option<UploadedFile> = None;
    let mut title = None;
    let mut description = None;
    let mut college = None;
    let mut course = None;
    let mut subcourse = None;
    let mut program_level = None;
    let mut semester = None;
    let mut subject = None;
    let mut upload_type = None;
    let mut professor = None;
    let mut year = None;
    let mut tags = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "title" => title = Some(read_text(field, "title").await?),
            "description" => description = Some(read_text(field, "description").await?),
            "college" => college = Some(read_text(field, "college").await?),
            "course" => course = Some(read_text(field, "course").await?),
            "subcourse" => subcourse = Some(read_text(field, "subcourse").await?),
            "program_level" => program_level = Some(read_text(field, "program_level").await?),
            "semester" => semester = Some(read_text(field, "semester").await?),
            "subject" => subject = Some(read_text(field, "subject").await?),
            "upload_type" => upload_type = Some(read_text(field, "upload_type").await?),
            "professor" => professor = Some(read_text(field, "professor").await?),
            "year" => year = Some(read_text(field, "year").await?),
            "tags" => tags = Some(read_text(field, "tags").await?),
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;

    let program_level = match program_level.filter(|v| !v.trim().is_empty()) {
        Some(level) => Some(parse_enum::<ProgramLevel>(&level)?),
        None => None,
    };
    let year = match year.filter(|v| !v.trim().is_empty()) {
        Some(y) => Some(
            y.trim()
                .parse::<i32>()
                .map_err(|_| AppError::Validation(format!("Invalid year '{}'", y)))?,
        ),
        None => None,
    };

    let metadata = UploadNoteDto {
        title: required(title, "title")?,
        description,
        college: required(college, "college")?.to_lowercase(),
        course: required(course, "course")?,
        subcourse,
        program_level,
        semester: required(semester, "semester")?,
        subject: required(subject, "subject")?,
        upload_type: parse_enum::<UploadType>(&required(upload_type, "upload_type")?)?,
        professor,
        year,
        tags: tags
            .map(|t| t.split(',').map(|s| s.to_string()).collect())
            .unwrap_or_default(),
    };

    let note = service.upload(uploader.as_ref(), metadata, file).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(note),
            Some("Note uploaded".to_string()),
            None,
        )),
    ))
}

/// Edit a note's descriptive fields (owner or moderator)
#[utoipa::path(
    patch,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteDto,
    responses(
        (status = 200, description = "Note updated", body = ApiResponse<NoteResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn update_note(
    user: AuthenticatedUser,
    State(service): State<Arc<ModerationService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateNoteDto>,
) -> Result<Json<ApiResponse<NoteResponseDto>>> {
    let note = service.edit(&user, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(note),
        Some("Note updated".to_string()),
        None,
    )))
}

/// Approve a pending note
#[utoipa::path(
    patch,
    path = "/api/notes/{id}/approve",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note approved", body = ApiResponse<NoteResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Moderator access required"),
        (status = 404, description = "Note not found"),
        (status = 409, description = "Note already decided")
    ),
    tag = "moderation",
    security(("bearer_auth" = []))
)]
pub async fn approve_note(
    RequireModerator(actor): RequireModerator,
    State(service): State<Arc<ModerationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NoteResponseDto>>> {
    let note = service.approve(&actor, id).await?;
    Ok(Json(ApiResponse::success(
        Some(note),
        Some("Note approved".to_string()),
        None,
    )))
}

/// Reject a pending note with a reason
#[utoipa::path(
    patch,
    path = "/api/notes/{id}/reject",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = RejectNoteDto,
    responses(
        (status = 200, description = "Note rejected", body = ApiResponse<NoteResponseDto>),
        (status = 400, description = "Reason missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Moderator access required"),
        (status = 404, description = "Note not found"),
        (status = 409, description = "Note already decided")
    ),
    tag = "moderation",
    security(("bearer_auth" = []))
)]
pub async fn reject_note(
    RequireModerator(actor): RequireModerator,
    State(service): State<Arc<ModerationService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<RejectNoteDto>,
) -> Result<Json<ApiResponse<NoteResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let note = service.reject(&actor, id, &dto.reason).await?;
    Ok(Json(ApiResponse::success(
        Some(note),
        Some("Note rejected".to_string()),
        None,
    )))
}

/// Delete a note (owner or senior moderator)
#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - file a delete request instead"),
        (status = 404, description = "Note not found")
    ),
    tag = "notes",
    security(("bearer_auth" = []))
)]
pub async fn delete_note(
    user: AuthenticatedUser,
    State(service): State<Arc<ModerationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Note deleted".to_string()),
        None,
    )))
}
