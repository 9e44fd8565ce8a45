use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Moderation status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "note_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteStatus::Pending => write!(f, "pending"),
            NoteStatus::Approved => write!(f, "approved"),
            NoteStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Kind of academic document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "upload_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UploadType {
    Notes,
    Pyqs,
    Books,
    Assignments,
    LabManuals,
    Others,
    CurrentSemester,
}

impl UploadType {
    /// Storage path segment
    pub fn code(self) -> &'static str {
        match self {
            UploadType::Notes => "notes",
            UploadType::Pyqs => "pyqs",
            UploadType::Books => "books",
            UploadType::Assignments => "assignments",
            UploadType::LabManuals => "lab-manuals",
            UploadType::Others => "others",
            UploadType::CurrentSemester => "current-semester",
        }
    }
}

impl std::str::FromStr for UploadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "notes" => Ok(UploadType::Notes),
            "pyqs" => Ok(UploadType::Pyqs),
            "books" => Ok(UploadType::Books),
            "assignments" => Ok(UploadType::Assignments),
            "lab-manuals" => Ok(UploadType::LabManuals),
            "others" => Ok(UploadType::Others),
            "current-semester" => Ok(UploadType::CurrentSemester),
            other => Err(format!("Unknown upload type '{}'", other)),
        }
    }
}

/// Degree program level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "program_level", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProgramLevel {
    #[serde(alias = "ug")]
    Ug,
    #[serde(alias = "pg")]
    Pg,
    #[serde(alias = "phd")]
    Phd,
}

impl ProgramLevel {
    /// Storage path segment, always upper-case
    pub fn code(self) -> &'static str {
        match self {
            ProgramLevel::Ug => "UG",
            ProgramLevel::Pg => "PG",
            ProgramLevel::Phd => "PHD",
        }
    }
}

impl std::str::FromStr for ProgramLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UG" => Ok(ProgramLevel::Ug),
            "PG" => Ok(ProgramLevel::Pg),
            "PHD" => Ok(ProgramLevel::Phd),
            other => Err(format!("Unknown program level '{}'", other)),
        }
    }
}

/// Action tag of a moderation history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Uploaded,
    Approved,
    Rejected,
    DeleteRequested,
    DeleteRequestRejected,
    Edited,
}

/// One entry of the append-only moderation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModerationEvent {
    pub action: ModerationAction,
    pub at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ModerationEvent {
    pub fn new(action: ModerationAction, actor_id: Option<Uuid>) -> Self {
        Self {
            action,
            at: Utc::now(),
            actor_id,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Where a note's blob lives. The record never holds file bytes.
#[derive(Debug, Clone, FromRow)]
pub struct FileRef {
    pub file_name: String,
    pub file_key: String,
    pub bucket: String,
    pub mime_type: String,
    pub file_size: i64,
    /// SHA-256 of the uploaded bytes
    pub checksum: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Database model for note
#[derive(Debug, Clone, FromRow)]
pub struct Note {
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
    #[sqlx(flatten)]
    pub file: FileRef,
    pub uploader_id: Option<Uuid>,
    pub status: NoteStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub moderation_history: Json<Vec<ModerationEvent>>,
    pub search_keywords: String,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.uploader_id == Some(user_id)
    }
}

/// Fields of a note about to be inserted
#[derive(Debug, Clone)]
pub struct NewNote {
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
    pub file: FileRef,
    pub uploader_id: Option<Uuid>,
    pub search_keywords: String,
}

/// Editable descriptive fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub professor: Option<String>,
    pub year: Option<i32>,
    pub tags: Option<Vec<String>>,
}

/// Listing filters. Visibility is decided by the caller.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub status: Option<NoteStatus>,
    pub college: Option<String>,
    pub course: Option<String>,
    pub subcourse: Option<String>,
    pub program_level: Option<ProgramLevel>,
    pub semester: Option<String>,
    pub subject: Option<String>,
    pub upload_type: Option<UploadType>,
    pub uploader_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Per-status note counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}

/// Moderation decisions taken by one moderator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModerationCounts {
    pub approved: i64,
    pub rejected: i64,
}

/// Lower-cased keyword blob used by free-text search
pub fn search_keywords(
    title: &str,
    subject: &str,
    course: &str,
    subcourse: Option<&str>,
    professor: Option<&str>,
    tags: &[String],
) -> String {
    let mut words: Vec<String> = Vec::new();
    let parts = [Some(title), Some(subject), Some(course), subcourse, professor];
    for part in parts.into_iter().flatten() {
        words.extend(part.split_whitespace().map(|w| w.to_lowercase()));
    }
    words.extend(tags.iter().map(|t| t.trim().to_lowercase()));
    words.retain(|w| !w.is_empty());
    words.dedup();
    words.join(" ")
}
