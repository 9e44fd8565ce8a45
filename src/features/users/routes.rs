use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// User directory routes (all require authentication)
pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/me", patch(handlers::update_profile))
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/users/{id}/stats", get(handlers::get_stats))
        .route(
            "/api/users/{id}/stats/recompute",
            post(handlers::recompute_stats),
        )
        .route("/api/users/{id}/role", patch(handlers::change_role))
        .route("/api/users/{id}/status", patch(handlers::change_status))
        .with_state(service)
}
