mod hub;
mod notification_service;

pub use hub::{InMemoryNotificationHub, NotificationHub, NotificationStream};
pub use notification_service::NotificationService;
