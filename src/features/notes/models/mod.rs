mod note;
mod state;

pub use note::{
    search_keywords, FileRef, ModerationAction, ModerationCounts, ModerationEvent, NewNote, Note,
    NoteChanges, NoteFilter, NoteStatus, ProgramLevel, StatusCounts, UploadType,
};
pub use state::{NoteState, Transition};
