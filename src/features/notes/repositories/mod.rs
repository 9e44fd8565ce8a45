mod note_repository;

pub use note_repository::{NoteRepository, PgNoteRepository};
