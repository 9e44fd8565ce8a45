mod delete_request_dto;

pub use delete_request_dto::{
    CreateDeleteRequestDto, DeleteRequestQueryParams, DeleteRequestResponseDto,
    ReviewDeleteRequestDto,
};
