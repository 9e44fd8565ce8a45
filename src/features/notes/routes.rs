use crate::features::notes::handlers;
use crate::features::notes::services::{ModerationService, NoteService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Routes open to guests. Signed-in viewers are recognised when a token is sent.
pub fn public_routes(
    note_service: Arc<NoteService>,
    moderation_service: Arc<ModerationService>,
    max_upload_size: usize,
) -> Router {
    let read_routes = Router::new()
        .route("/api/notes", get(handlers::list_notes))
        .route("/api/notes/{id}", get(handlers::get_note))
        .route("/api/notes/{id}/download", get(handlers::download_note))
        .with_state(note_service);

    let upload_routes = Router::new()
        .route(
            "/api/notes/upload",
            post(handlers::upload_note)
                .layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD)),
        )
        .with_state(moderation_service);

    Router::new().merge(read_routes).merge(upload_routes)
}

/// Routes that require a session
pub fn protected_routes(
    note_service: Arc<NoteService>,
    moderation_service: Arc<ModerationService>,
) -> Router {
    let read_routes = Router::new()
        .route("/api/notes/mine", get(handlers::my_notes))
        .route("/api/notes/stats", get(handlers::note_stats))
        .with_state(note_service);

    let moderation_routes = Router::new()
        .route(
            "/api/notes/{id}",
            patch(handlers::update_note).delete(handlers::delete_note),
        )
        .route("/api/notes/{id}/approve", patch(handlers::approve_note))
        .route("/api/notes/{id}/reject", patch(handlers::reject_note))
        .with_state(moderation_service);

    Router::new().merge(read_routes).merge(moderation_routes)
}
