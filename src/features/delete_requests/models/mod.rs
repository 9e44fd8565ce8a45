mod delete_request;

pub use delete_request::{DeleteRequest, DeleteRequestStatus, NewDeleteRequest};
