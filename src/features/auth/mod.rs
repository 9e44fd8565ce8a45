mod jwks;
mod session;
mod validator;

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod model;
pub mod policy;
pub mod routes;
pub mod services;

pub use jwks::JwksClient;
pub use session::{SessionAuthenticator, SessionTokens};
pub use validator::{GoogleTokenValidator, IdentityVerifier};
