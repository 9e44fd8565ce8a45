//! Applications for the moderator role.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/moderator-requests` | Apply (users only) |
//! | GET | `/api/moderator-requests/mine` | Own latest application |
//! | GET | `/api/moderator-requests` | Review queue (senior moderator+) |
//! | PATCH | `/api/moderator-requests/{id}/approve` | Approve and promote |
//! | PATCH | `/api/moderator-requests/{id}/reject` | Reject with reason |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::ModeratorRequestService;
