use crate::features::delete_requests::handlers;
use crate::features::delete_requests::services::DeleteRequestService;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<DeleteRequestService>) -> Router {
    Router::new()
        .route(
            "/api/delete-requests",
            get(handlers::list_delete_requests).post(handlers::create_delete_request),
        )
        .route("/api/delete-requests/{id}", get(handlers::get_delete_request))
        .route(
            "/api/delete-requests/{id}/approve",
            patch(handlers::approve_delete_request),
        )
        .route(
            "/api/delete-requests/{id}/reject",
            patch(handlers::reject_delete_request),
        )
        .with_state(service)
}
