mod user_dto;

pub use user_dto::{
    ChangeRoleRequestDto, ChangeStatusRequestDto, UpdateProfileRequestDto, UserQueryParams,
    UserResponseDto,
};
