use crate::features::moderator_requests::handlers;
use crate::features::moderator_requests::services::ModeratorRequestService;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<ModeratorRequestService>) -> Router {
    Router::new()
        .route(
            "/api/moderator-requests",
            get(handlers::list_requests).post(handlers::apply),
        )
        .route("/api/moderator-requests/mine", get(handlers::my_request))
        .route(
            "/api/moderator-requests/{id}/approve",
            patch(handlers::approve_request),
        )
        .route(
            "/api/moderator-requests/{id}/reject",
            patch(handlers::reject_request),
        )
        .with_state(service)
}
