pub mod delete_request_handler;

pub use delete_request_handler::{
    __path_approve_delete_request, __path_create_delete_request, __path_get_delete_request,
    __path_list_delete_requests, __path_reject_delete_request, approve_delete_request,
    create_delete_request, get_delete_request, list_delete_requests, reject_delete_request,
};
