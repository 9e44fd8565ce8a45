mod moderation_service;
mod note_service;
pub mod storage_key;

pub use moderation_service::ModerationService;
pub use note_service::{is_visible_to, NoteService};
