use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::admin::handlers as admin_handlers;
use crate::features::auth;
use crate::features::delete_requests::{
    dtos as delete_requests_dtos, handlers as delete_requests_handlers,
    models as delete_requests_models,
};
use crate::features::moderator_requests::{
    dtos as moderator_requests_dtos, handlers as moderator_requests_handlers,
    models as moderator_requests_models,
};
use crate::features::notes::{dtos as notes_dtos, handlers as notes_handlers, models as notes_models};
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
    models as notifications_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers, models as users_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::google_login,
        auth::handlers::get_me,
        // Users
        users_handlers::list_users,
        users_handlers::update_profile,
        users_handlers::get_user,
        users_handlers::get_stats,
        users_handlers::recompute_stats,
        users_handlers::change_role,
        users_handlers::change_status,
        // Notes
        notes_handlers::list_notes,
        notes_handlers::my_notes,
        notes_handlers::note_stats,
        notes_handlers::get_note,
        notes_handlers::download_note,
        notes_handlers::upload_note,
        notes_handlers::update_note,
        notes_handlers::approve_note,
        notes_handlers::reject_note,
        notes_handlers::delete_note,
        // Delete requests
        delete_requests_handlers::create_delete_request,
        delete_requests_handlers::list_delete_requests,
        delete_requests_handlers::get_delete_request,
        delete_requests_handlers::approve_delete_request,
        delete_requests_handlers::reject_delete_request,
        // Moderator requests
        moderator_requests_handlers::apply,
        moderator_requests_handlers::my_request,
        moderator_requests_handlers::list_requests,
        moderator_requests_handlers::approve_request,
        moderator_requests_handlers::reject_request,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::unread_count,
        notifications_handlers::stream_notifications,
        notifications_handlers::mark_read,
        notifications_handlers::mark_all_read,
        // Admin
        admin_handlers::reconcile_storage,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Auth
            auth::policy::Role,
            auth::model::AuthenticatedUser,
            auth::dtos::GoogleLoginRequestDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::MeResponseDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::MeResponseDto>,
            // Users
            users_models::UserStats,
            users_dtos::UserResponseDto,
            users_dtos::UpdateProfileRequestDto,
            users_dtos::ChangeRoleRequestDto,
            users_dtos::ChangeStatusRequestDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            ApiResponse<users_models::UserStats>,
            // Notes
            notes_models::NoteStatus,
            notes_models::UploadType,
            notes_models::ProgramLevel,
            notes_models::ModerationAction,
            notes_models::ModerationEvent,
            notes_dtos::UploadNoteForm,
            notes_dtos::UpdateNoteDto,
            notes_dtos::RejectNoteDto,
            notes_dtos::NoteResponseDto,
            notes_dtos::DownloadResponseDto,
            notes_dtos::NoteStatsDto,
            notes_dtos::ReconcileReportDto,
            ApiResponse<notes_dtos::NoteResponseDto>,
            ApiResponse<Vec<notes_dtos::NoteResponseDto>>,
            ApiResponse<notes_dtos::DownloadResponseDto>,
            ApiResponse<notes_dtos::NoteStatsDto>,
            ApiResponse<notes_dtos::ReconcileReportDto>,
            // Delete requests
            delete_requests_models::DeleteRequestStatus,
            delete_requests_dtos::CreateDeleteRequestDto,
            delete_requests_dtos::ReviewDeleteRequestDto,
            delete_requests_dtos::DeleteRequestResponseDto,
            ApiResponse<delete_requests_dtos::DeleteRequestResponseDto>,
            ApiResponse<Vec<delete_requests_dtos::DeleteRequestResponseDto>>,
            // Moderator requests
            moderator_requests_models::ModeratorRequestStatus,
            moderator_requests_dtos::ApplyModeratorDto,
            moderator_requests_dtos::ReviewModeratorRequestDto,
            moderator_requests_dtos::ModeratorRequestResponseDto,
            ApiResponse<moderator_requests_dtos::ModeratorRequestResponseDto>,
            ApiResponse<Vec<moderator_requests_dtos::ModeratorRequestResponseDto>>,
            // Notifications
            notifications_models::NotificationKind,
            notifications_dtos::NotificationResponseDto,
            notifications_dtos::UnreadCountDto,
            notifications_dtos::MarkAllReadResponseDto,
            ApiResponse<notifications_dtos::NotificationResponseDto>,
            ApiResponse<Vec<notifications_dtos::NotificationResponseDto>>,
            ApiResponse<notifications_dtos::UnreadCountDto>,
            ApiResponse<notifications_dtos::MarkAllReadResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Google sign-in and session tokens"),
        (name = "users", description = "User directory, roles and contribution stats"),
        (name = "notes", description = "Note upload, browsing and moderation"),
        (name = "delete-requests", description = "Moderator requests to delete approved notes"),
        (name = "moderator-requests", description = "Applications for the moderator role"),
        (name = "notifications", description = "In-app notifications and live stream"),
        (name = "admin", description = "Maintenance endpoints (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "College Notes API",
        version = "0.1.0",
        description = "API documentation for College Notes",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_moderation_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/notes/upload",
            "/api/notes/{id}/approve",
            "/api/delete-requests/{id}/approve",
            "/api/moderator-requests/mine",
            "/api/admin/storage/reconcile",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
