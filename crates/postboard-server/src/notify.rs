//! Broadcast of post change events to live subscribers.

use postboard_core::event::PostEvent;
use tokio::sync::broadcast;

/// Default channel capacity; subscribers further behind skip ahead.
pub const DEFAULT_CAPACITY: usize = 64;

/// Fire-and-forget publisher of [`PostEvent`]s. Cloning shares the channel.
#[derive(Clone)]
pub struct ChangeNotifier {
  tx: broadcast::Sender<PostEvent>,
}

impl ChangeNotifier {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Send `event` to every current subscriber and return how many received
  /// it. Nothing is buffered for subscribers that connect later.
  pub fn publish(&self, event: PostEvent) -> usize {
    let action = event.action();
    let post_id = event.post_id();
    let receivers = self.tx.send(event).unwrap_or(0);
    tracing::debug!(%action, %post_id, receivers, "published post event");
    receivers
  }

  pub fn subscribe(&self) -> broadcast::Receiver<PostEvent> {
    self.tx.subscribe()
  }
}

impl Default for ChangeNotifier {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn publish_without_subscribers_is_harmless() {
    let n = ChangeNotifier::default();
    assert_eq!(n.publish(PostEvent::Delete(Uuid::new_v4())), 0);
  }

  #[tokio::test]
  async fn every_subscriber_receives_the_event() {
    let n = ChangeNotifier::default();
    let mut a = n.subscribe();
    let mut b = n.subscribe();
    let id = Uuid::new_v4();

    assert_eq!(n.publish(PostEvent::Delete(id)), 2);
    assert_eq!(a.recv().await.unwrap(), PostEvent::Delete(id));
    assert_eq!(b.recv().await.unwrap(), PostEvent::Delete(id));
  }

  #[tokio::test]
  async fn late_subscriber_misses_earlier_events() {
    let n = ChangeNotifier::default();
    let mut early = n.subscribe();
    n.publish(PostEvent::Delete(Uuid::new_v4()));

    let mut late = n.subscribe();
    let second = Uuid::new_v4();
    n.publish(PostEvent::Delete(second));

    assert_eq!(late.recv().await.unwrap().post_id(), second);
    assert_ne!(early.recv().await.unwrap().post_id(), second);
  }
}
