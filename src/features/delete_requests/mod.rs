//! Delete requests.
//!
//! Moderators cannot remove approved notes they do not own. They file a
//! request instead, which a senior moderator approves (the note is deleted and
//! the request ends `executed`) or rejects.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/delete-requests` | File a request (moderator+) |
//! | GET | `/api/delete-requests` | Review queue (senior moderator+) |
//! | GET | `/api/delete-requests/{id}` | Get one (moderator+) |
//! | PATCH | `/api/delete-requests/{id}/approve` | Approve and execute |
//! | PATCH | `/api/delete-requests/{id}/reject` | Reject with reason |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::DeleteRequestService;
