use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::admin::handlers;
use crate::features::notes::ModerationService;

/// Maintenance routes (admin only)
pub fn routes(moderation_service: Arc<ModerationService>) -> Router {
    Router::new()
        .route(
            "/api/admin/storage/reconcile",
            post(handlers::reconcile_storage),
        )
        .with_state(moderation_service)
}
