mod admin_handler;

pub use admin_handler::{__path_reconcile_storage, reconcile_storage};
