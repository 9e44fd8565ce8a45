pub mod auth_handler;

pub use auth_handler::{__path_get_me, __path_google_login, get_me, google_login};
