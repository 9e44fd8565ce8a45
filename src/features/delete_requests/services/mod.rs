mod delete_request_service;

pub use delete_request_service::DeleteRequestService;
