use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::features::notifications::dtos::NotificationResponseDto;

pub type NotificationStream = BoxStream<'static, NotificationResponseDto>;

/// Per-user publish/subscribe channel for live notifications.
///
/// `publish` never blocks and never fails; an event that cannot be delivered
/// is dropped (the persisted record remains).
pub trait NotificationHub: Send + Sync {
    fn subscribe(&self, user_id: Uuid) -> NotificationStream;

    fn publish(&self, user_id: Uuid, event: NotificationResponseDto);
}

/// Process-local hub backed by bounded mpsc channels
pub struct InMemoryNotificationHub {
    subscribers: Mutex<HashMap<Uuid, Vec<mpsc::Sender<NotificationResponseDto>>>>,
    buffer: usize,
}

impl InMemoryNotificationHub {
    const DEFAULT_BUFFER: usize = 32;

    pub fn new() -> Self {
        Self::with_buffer(Self::DEFAULT_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Open subscriptions for `user_id`
    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers
            .get(&user_id)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryNotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub for InMemoryNotificationHub {
    fn subscribe(&self, user_id: Uuid) -> NotificationStream {
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let senders = subscribers.entry(user_id).or_default();
        senders.retain(|s| !s.is_closed());
        senders.push(tx);
        tracing::debug!(
            "Notification subscriber added for user {} ({} open)",
            user_id,
            senders.len()
        );
        Box::pin(ReceiverStream::new(rx))
    }

    fn publish(&self, user_id: Uuid, event: NotificationResponseDto) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let Some(senders) = subscribers.get_mut(&user_id) else {
            return;
        };

        senders.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Notification stream for user {} is full, dropping event", user_id);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });

        if senders.is_empty() {
            subscribers.remove(&user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::notifications::models::NotificationKind;
    use chrono::Utc;
    use futures::StreamExt;

    fn event(title: &str) -> NotificationResponseDto {
        NotificationResponseDto {
            id: Uuid::new_v4(),
            kind: NotificationKind::NoteApproved,
            title: title.to_string(),
            message: String::new(),
            note_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_only_own_events() {
        let hub = InMemoryNotificationHub::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut stream = hub.subscribe(alice);

        hub.publish(bob, event("for bob"));
        hub.publish(alice, event("for alice"));

        let received = stream.next().await.unwrap();
        assert_eq!(received.title, "for alice");
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_dropped() {
        let hub = InMemoryNotificationHub::new();
        let user = Uuid::new_v4();
        let stream = hub.subscribe(user);
        assert_eq!(hub.subscriber_count(user), 1);

        drop(stream);
        hub.publish(user, event("nobody listening"));
        assert_eq!(hub.subscriber_count(user), 0);
    }

    #[tokio::test]
    async fn test_full_buffer_does_not_block_publisher() {
        let hub = InMemoryNotificationHub::with_buffer(1);
        let user = Uuid::new_v4();
        let mut stream = hub.subscribe(user);

        hub.publish(user, event("first"));
        hub.publish(user, event("second"));

        assert_eq!(stream.next().await.unwrap().title, "first");
        assert_eq!(hub.subscriber_count(user), 1);
    }
}
