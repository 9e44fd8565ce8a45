//! In-app notifications.
//!
//! Records are created as a side effect of moderation and account actions and
//! pushed to open streams through an injected [`services::NotificationHub`].
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/notifications` | List own notifications |
//! | GET | `/api/notifications/unread-count` | Unread counter |
//! | GET | `/api/notifications/stream` | SSE push stream |
//! | PATCH | `/api/notifications/{id}/read` | Mark one as read |
//! | PATCH | `/api/notifications/read-all` | Mark all as read |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::{InMemoryNotificationHub, NotificationHub, NotificationService};
