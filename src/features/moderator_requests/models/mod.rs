mod moderator_request;

pub use moderator_request::{ModeratorRequest, ModeratorRequestStatus};
