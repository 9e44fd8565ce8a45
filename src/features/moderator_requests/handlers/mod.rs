pub mod moderator_request_handler;

pub use moderator_request_handler::{
    __path_apply, __path_approve_request, __path_list_requests, __path_my_request,
    __path_reject_request, apply, approve_request, list_requests, my_request, reject_request,
};
