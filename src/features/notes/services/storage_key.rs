//! Object keys for note blobs.
//!
//! ```text
//! {pending|college-notes}/{college}[/{LEVEL}]/{course}[/{subcourse}]/sem{n}/{subject}/{type}/{file}_{millis}.{ext}
//! ```

use crate::features::notes::models::{ProgramLevel, UploadType};
use crate::shared::constants::{extension_for_content_type, APPROVED_PREFIX, PENDING_PREFIX};
use crate::shared::validation::{
    FILENAME_FORBIDDEN_REGEX, SEGMENT_STRIP_REGEX, TRAILING_TIMESTAMP_REGEX, WHITESPACE_RUN_REGEX,
};

/// Catalogue position of a note, used to build its object key
#[derive(Debug, Clone)]
pub struct KeyLocation<'a> {
    pub college: &'a str,
    pub program_level: Option<ProgramLevel>,
    pub course: &'a str,
    pub subcourse: Option<&'a str>,
    pub semester: &'a str,
    pub subject: &'a str,
    pub upload_type: UploadType,
}

/// Lower-case a path segment and drop everything outside `[a-zA-Z0-9_-]`
pub fn sanitize_segment(raw: &str) -> String {
    SEGMENT_STRIP_REGEX
        .replace_all(raw.trim(), "")
        .to_lowercase()
}

/// Name of the first required segment that sanitises to nothing
pub fn empty_segment(location: &KeyLocation<'_>) -> Option<&'static str> {
    [
        ("college", location.college),
        ("course", location.course),
        ("semester", location.semester),
        ("subject", location.subject),
    ]
    .into_iter()
    .find(|(_, raw)| sanitize_segment(raw).is_empty())
    .map(|(field, _)| field)
}

/// Split into `(stem, extension)`; the extension is empty when absent
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => (file_name, ""),
    }
}

fn sanitize_stem(stem: &str) -> String {
    let stripped = FILENAME_FORBIDDEN_REGEX.replace_all(stem, "");
    let lowered = stripped.trim().to_lowercase();
    let joined = WHITESPACE_RUN_REGEX.replace_all(&lowered, "_").into_owned();
    if joined.is_empty() {
        "file".to_string()
    } else {
        joined
    }
}

fn resolve_extension(ext: &str, content_type: &str) -> String {
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if !ext.is_empty() {
        return ext;
    }
    extension_for_content_type(content_type)
        .unwrap_or("bin")
        .to_string()
}

/// Final path component: sanitized stem, a unix-millis suffix unless one is
/// already present, and the extension
pub fn build_file_name(original_file_name: &str, content_type: &str, now_millis: i64) -> String {
    let base = original_file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_file_name);
    let (stem, ext) = split_extension(base);
    let mut stem = sanitize_stem(stem);
    if !TRAILING_TIMESTAMP_REGEX.is_match(&stem) {
        stem = format!("{}_{}", stem, now_millis);
    }
    format!("{}.{}", stem, resolve_extension(ext, content_type))
}

pub fn build_storage_key(
    location: &KeyLocation<'_>,
    original_file_name: &str,
    content_type: &str,
    pending: bool,
    now_millis: i64,
) -> String {
    let prefix = if pending { PENDING_PREFIX } else { APPROVED_PREFIX };

    let mut segments: Vec<String> = vec![prefix.to_string(), sanitize_segment(location.college)];
    if let Some(level) = location.program_level {
        segments.push(level.code().to_string());
    }
    segments.push(sanitize_segment(location.course));
    if let Some(subcourse) = location.subcourse.map(sanitize_segment) {
        if !subcourse.is_empty() {
            segments.push(subcourse);
        }
    }
    segments.push(format!("sem{}", sanitize_segment(location.semester)));
    segments.push(sanitize_segment(location.subject));
    segments.push(location.upload_type.code().to_string());

    format!(
        "{}/{}",
        segments.join("/"),
        build_file_name(original_file_name, content_type, now_millis)
    )
}

/// Last path component of a key
pub fn key_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Whether `key` lives under the pending prefix
pub fn is_pending_key(key: &str) -> bool {
    key.strip_prefix(PENDING_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'))
}
