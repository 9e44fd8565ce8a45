mod moderator_request_dto;

pub use moderator_request_dto::{
    ApplyModeratorDto, ModeratorRequestQueryParams, ModeratorRequestResponseDto,
    ReviewModeratorRequestDto,
};
