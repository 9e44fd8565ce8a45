mod moderator_request_repository;

pub use moderator_request_repository::{ModeratorRequestRepository, PgModeratorRequestRepository};
