use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    Json,
};
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::dtos::{
    MarkAllReadResponseDto, NotificationQueryParams, NotificationResponseDto, UnreadCountDto,
};
use crate::features::notifications::services::NotificationService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(PaginationQuery, NotificationQueryParams),
    responses(
        (status = 200, description = "Notifications retrieved", body = ApiResponse<Vec<NotificationResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Query(pagination): Query<PaginationQuery>,
    Query(params): Query<NotificationQueryParams>,
) -> Result<Json<ApiResponse<Vec<NotificationResponseDto>>>> {
    let (items, total) = service
        .list(user.user_id, params.unread_only, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCountDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<UnreadCountDto>>> {
    let unread = service.unread_count(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(UnreadCountDto { unread }),
        None,
        None,
    )))
}

/// Live notification stream (Server-Sent Events).
///
/// Browsers cannot set headers on `EventSource`, so the session token may
/// also be passed as the `access_token` query parameter.
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "SSE stream of notification events", content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn stream_notifications(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Response {
    tracing::debug!("Notification stream opened for user {}", user.user_id);

    let stream = service.subscribe(user.user_id).filter_map(|notification| {
        match serde_json::to_string(&notification) {
            Ok(data) => Some(Ok::<_, Infallible>(
                Event::default().event(notification.kind.as_str()).data(data),
            )),
            Err(e) => {
                tracing::warn!("Failed to serialize notification {}: {}", notification.id, e);
                None
            }
        }
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
        .into_response()
}

/// Mark one notification as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationResponseDto>>> {
    let notification = service.mark_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(notification), None, None)))
}

/// Mark every notification of the caller as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Notifications marked as read", body = ApiResponse<MarkAllReadResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<MarkAllReadResponseDto>>> {
    let updated = service.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(MarkAllReadResponseDto { updated }),
        None,
        None,
    )))
}
