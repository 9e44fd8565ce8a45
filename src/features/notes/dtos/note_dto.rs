use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::notes::models::{
    ModerationEvent, Note, NoteFilter, NoteStatus, ProgramLevel, StatusCounts, UploadType,
};
use crate::shared::validation::{CODE_REGEX, SEMESTER_REGEX};

/// Upload form for OpenAPI documentation.
/// The handler reads these fields from `multipart/form-data` directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadNoteForm {
    /// The document to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    #[schema(example = "Unit 1 Notes")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "nitk")]
    pub college: String,
    #[schema(example = "cse")]
    pub course: String,
    pub subcourse: Option<String>,
    #[schema(example = "UG")]
    pub program_level: Option<String>,
    #[schema(example = "6")]
    pub semester: String,
    #[schema(example = "os")]
    pub subject: String,
    #[schema(example = "notes")]
    pub upload_type: String,
    pub professor: Option<String>,
    pub year: Option<i32>,
    /// Comma separated
    #[schema(example = "scheduling,paging")]
    pub tags: Option<String>,
}

/// Descriptive metadata of an upload, collected from the form fields
#[derive(Debug, Clone, Validate)]
pub struct UploadNoteDto {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(
        length(min = 2, max = 50),
        regex(
            path = *CODE_REGEX,
            message = "College must be a lowercase code such as 'nitk' or 'ipu-delhi'"
        )
    )]
    pub college: String,

    #[validate(length(min = 1, max = 50, message = "Course must be 1-50 characters"))]
    pub course: String,

    #[validate(length(min = 1, max = 50, message = "Subcourse must be 1-50 characters"))]
    pub subcourse: Option<String>,

    pub program_level: Option<ProgramLevel>,

    #[validate(regex(path = *SEMESTER_REGEX, message = "Semester must be between 1 and 8"))]
    pub semester: String,

    #[validate(length(min = 1, max = 100, message = "Subject must be 1-100 characters"))]
    pub subject: String,

    pub upload_type: UploadType,

    #[validate(length(max = 100, message = "Professor must be at most 100 characters"))]
    pub professor: Option<String>,

    #[validate(range(min = 1950, max = 2100, message = "Year must be between 1950 and 2100"))]
    pub year: Option<i32>,

    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Vec<String>,
}

/// Raw file part of an upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Editable fields of a note. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateNoteDto {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 100, message = "Professor must be at most 100 characters"))]
    pub professor: Option<String>,

    #[validate(range(min = 1950, max = 2100, message = "Year must be between 1950 and 2100"))]
    pub year: Option<i32>,

    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectNoteDto {
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NoteQueryParams {
    /// Ignored for viewers below moderator, who only see approved notes
    pub status: Option<NoteStatus>,
    pub college: Option<String>,
    pub course: Option<String>,
    pub subcourse: Option<String>,
    pub program_level: Option<ProgramLevel>,
    pub semester: Option<String>,
    pub subject: Option<String>,
    pub upload_type: Option<UploadType>,
    /// Free-text match against title, subject, course, professor and tags
    pub search: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<NoteQueryParams> for NoteFilter {
    fn from(params: NoteQueryParams) -> Self {
        Self {
            status: params.status,
            college: non_blank(params.college).map(|c| c.to_lowercase()),
            course: non_blank(params.course),
            subcourse: non_blank(params.subcourse),
            program_level: params.program_level,
            semester: non_blank(params.semester),
            subject: non_blank(params.subject),
            upload_type: params.upload_type,
            uploader_id: None,
            search: non_blank(params.search),
        }
    }
}

/// Public view of a note
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponseDto {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub college: String,
    pub course: String,
    pub subcourse: Option<String>,
    pub program_level: Option<ProgramLevel>,
    pub semester: String,
    pub subject: String,
    pub upload_type: UploadType,
    pub professor: Option<String>,
    pub year: Option<i32>,
    pub tags: Vec<String>,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub uploader_id: Option<Uuid>,
    pub status: NoteStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub moderation_history: Vec<ModerationEvent>,
    pub download_count: i64,
    /// Short-lived link to the file, absent when it could not be signed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponseDto {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            description: n.description,
            college: n.college,
            course: n.course,
            subcourse: n.subcourse,
            program_level: n.program_level,
            semester: n.semester,
            subject: n.subject,
            upload_type: n.upload_type,
            professor: n.professor,
            year: n.year,
            tags: n.tags,
            file_name: n.file.file_name,
            mime_type: n.file.mime_type,
            file_size: n.file.file_size,
            uploader_id: n.uploader_id,
            status: n.status,
            approved_by: n.approved_by,
            approved_at: n.approved_at,
            rejected_by: n.rejected_by,
            rejected_at: n.rejected_at,
            rejection_reason: n.rejection_reason,
            moderation_history: n.moderation_history.0,
            download_count: n.download_count,
            download_url: None,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadResponseDto {
    pub url: String,
    pub file_name: String,
    /// Seconds until `url` stops working
    pub expires_in: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteStatsDto {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total: i64,
}

impl From<StatusCounts> for NoteStatsDto {
    fn from(c: StatusCounts) -> Self {
        Self {
            pending: c.pending,
            approved: c.approved,
            rejected: c.rejected,
            total: c.total(),
        }
    }
}

/// Outcome of a storage reconciliation sweep
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReconcileReportDto {
    /// Approved notes found under the pending prefix
    pub scanned: usize,
    pub relocated: Vec<Uuid>,
    /// Notes whose blob exists under neither prefix
    pub missing: Vec<Uuid>,
    /// Relocations that failed again
    pub failed: Vec<Uuid>,
}
