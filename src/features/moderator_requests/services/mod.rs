mod moderator_request_service;

pub use moderator_request_service::ModeratorRequestService;
