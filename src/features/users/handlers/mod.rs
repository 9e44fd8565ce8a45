pub mod user_handler;

pub use user_handler::{
    __path_change_role, __path_change_status, __path_get_stats, __path_get_user,
    __path_list_users, __path_recompute_stats, __path_update_profile, change_role, change_status,
    get_stats, get_user, list_users, recompute_stats, update_profile,
};
