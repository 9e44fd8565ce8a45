mod delete_request_repository;

pub use delete_request_repository::{DeleteRequestRepository, PgDeleteRequestRepository};
