mod user;

pub use user::{GoogleProfile, User, UserFilter, UserStats};
