pub mod moderation_handler;
pub mod note_handler;

pub use moderation_handler::{
    __path_approve_note, __path_delete_note, __path_reject_note, __path_update_note,
    __path_upload_note, approve_note, delete_note, reject_note, update_note, upload_note,
};
pub use note_handler::{
    __path_download_note, __path_get_note, __path_list_notes, __path_my_notes, __path_note_stats,
    download_note, get_note, list_notes, my_notes, note_stats,
};
