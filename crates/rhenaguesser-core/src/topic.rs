//! Ordered fan-out to the connections subscribed to one session.
//!
//! Each connection owns an unbounded queue of [`ServerEvent`]s drained by
//! its socket task. A [`Topic`] holds the sending halves. Publishing only
//! pushes into queues, so it never blocks and is safe to call while the
//! session lock is held; that is what makes every subscriber observe one
//! session's events in the same order.

use rhenaguesser_types::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;
use tracing::debug;

/// Sending half of a connection's outbound queue.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Subscribers of one session, in subscription order.
#[derive(Debug, Default)]
pub struct Topic {
    subscribers: Vec<(ConnectionId, Outbox)>,
}

impl Topic {
    /// Add a subscriber. Subscribing twice is a no-op.
    pub fn subscribe(&mut self, connection: ConnectionId, outbox: Outbox) {
        if !self.contains(connection) {
            self.subscribers.push((connection, outbox));
        }
    }

    /// Remove a subscriber, returning whether it was present.
    pub fn unsubscribe(&mut self, connection: ConnectionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != connection);
        self.subscribers.len() < before
    }

    /// Whether `connection` is subscribed.
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.subscribers.iter().any(|(id, _)| *id == connection)
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Send `event` to every subscriber. Returns how many received it.
    pub fn publish(&mut self, event: &ServerEvent) -> usize {
        self.send_where(event, |_| true)
    }

    /// Send `event` to every subscriber except `skip`.
    pub fn publish_except(&mut self, skip: ConnectionId, event: &ServerEvent) -> usize {
        self.send_where(event, |id| id != skip)
    }

    /// Send to matching subscribers and drop those whose queue is closed.
    fn send_where(&mut self, event: &ServerEvent, include: impl Fn(ConnectionId) -> bool) -> usize {
        let mut delivered: usize = 0;
        self.subscribers.retain(|(id, outbox)| {
            if !include(*id) {
                return !outbox.is_closed();
            }
            if outbox.send(event.clone()).is_ok() {
                delivered = delivered.saturating_add(1);
                true
            } else {
                debug!(connection = %id, action = event.action(), "dropping closed subscriber");
                false
            }
        });
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(topic: &mut Topic) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        topic.subscribe(id, tx);
        (id, rx)
    }

    #[test]
    fn publish_preserves_order_for_every_subscriber() {
        let mut topic = Topic::default();
        let (_, mut a) = subscriber(&mut topic);
        let (_, mut b) = subscriber(&mut topic);

        topic.publish(&ServerEvent::Pong);
        topic.publish(&ServerEvent::error("second"));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().ok(), Some(ServerEvent::Pong));
            assert_eq!(rx.try_recv().ok(), Some(ServerEvent::error("second")));
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn publish_except_skips_one() {
        let mut topic = Topic::default();
        let (a_id, mut a) = subscriber(&mut topic);
        let (_, mut b) = subscriber(&mut topic);

        assert_eq!(topic.publish_except(a_id, &ServerEvent::Pong), 1);
        assert!(a.try_recv().is_err());
        assert_eq!(b.try_recv().ok(), Some(ServerEvent::Pong));
    }

    #[test]
    fn closed_subscribers_are_pruned() {
        let mut topic = Topic::default();
        let (_, a) = subscriber(&mut topic);
        let (_, _b) = subscriber(&mut topic);
        drop(a);

        assert_eq!(topic.publish(&ServerEvent::Pong), 1);
        assert_eq!(topic.len(), 1);
    }

    #[test]
    fn subscribe_is_idempotent_and_unsubscribe_reports() {
        let mut topic = Topic::default();
        let (id, _rx) = subscriber(&mut topic);
        let (tx, _rx2) = mpsc::unbounded_channel();
        topic.subscribe(id, tx);
        assert_eq!(topic.len(), 1);

        assert!(topic.unsubscribe(id));
        assert!(!topic.unsubscribe(id));
        assert!(topic.is_empty());
    }
}
