//! User directory feature.
//!
//! Accounts are created on first Google sign-in. Roles and activation are
//! managed under the role hierarchy in [`crate::features::auth::policy`].
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users` | List users (senior moderator+) |
//! | PATCH | `/api/users/me` | Update own name / avatar |
//! | GET | `/api/users/{id}` | Get user (self or moderator+) |
//! | GET | `/api/users/{id}/stats` | Cached statistics |
//! | POST | `/api/users/{id}/stats/recompute` | Rebuild statistics |
//! | PATCH | `/api/users/{id}/role` | Change role |
//! | PATCH | `/api/users/{id}/status` | Activate / deactivate |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::UserService;
