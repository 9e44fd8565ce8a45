mod note_dto;

pub use note_dto::{
    DownloadResponseDto, NoteQueryParams, NoteResponseDto, NoteStatsDto, ReconcileReportDto,
    RejectNoteDto, UpdateNoteDto, UploadNoteDto, UploadNoteForm, UploadedFile,
};
