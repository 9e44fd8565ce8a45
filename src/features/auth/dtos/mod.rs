mod auth_dto;

pub use auth_dto::{AuthResponseDto, GoogleLoginRequestDto, MeResponseDto};
