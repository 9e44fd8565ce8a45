mod notification_dto;

pub use notification_dto::{
    MarkAllReadResponseDto, NotificationQueryParams, NotificationResponseDto, UnreadCountDto,
};
