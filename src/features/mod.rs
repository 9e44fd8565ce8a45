pub mod admin;
pub mod auth;
pub mod delete_requests;
pub mod moderator_requests;
pub mod notes;
pub mod notifications;
pub mod users;
