use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationService;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/notifications/unread-count", get(handlers::unread_count))
        .route("/api/notifications/stream", get(handlers::stream_notifications))
        .route("/api/notifications/read-all", patch(handlers::mark_all_read))
        .route("/api/notifications/{id}/read", patch(handlers::mark_read))
        .with_state(service)
}
