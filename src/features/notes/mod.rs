//! Notes catalogue and moderation engine.
//!
//! Uploads land under the `pending/` prefix and wait for a moderator.
//! Approval moves the blob under `college-notes/`; rejection drops it.
//! See [`models::NoteState`] for the allowed transitions.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/notes` | Browse (approved only below moderator) |
//! | POST | `/api/notes/upload` | Upload, guests allowed |
//! | GET | `/api/notes/mine` | Own uploads |
//! | GET | `/api/notes/stats` | Counts per status (moderator+) |
//! | GET | `/api/notes/{id}` | Detail with download link |
//! | GET | `/api/notes/{id}/download` | Signed download link |
//! | PATCH | `/api/notes/{id}` | Edit (owner or moderator+) |
//! | PATCH | `/api/notes/{id}/approve` | Approve (moderator+) |
//! | PATCH | `/api/notes/{id}/reject` | Reject with reason (moderator+) |
//! | DELETE | `/api/notes/{id}` | Delete (owner or senior moderator+) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::{ModerationService, NoteService};
