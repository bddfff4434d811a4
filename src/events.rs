//! Event bus (spec §6): a single topic carrying an opaque, human-readable
//! payload, delivered at-most-once and unordered. Grounded on the
//! teacher's `rate_limit::backend` trait-with-swappable-implementations
//! pattern and the Go `events.go` NATS subscriber - the trait boundary is
//! where a real broker adapter would plug in; wire framing is out of
//! scope per spec §1, so this ships an in-process `broadcast` channel.

use std::sync::Arc;

use tokio::sync::broadcast;

/// The wire topic name, exactly as named in spec §6. The "corpus updated"
/// vocabulary used elsewhere in this codebase's commentary refers to the
/// same notification conceptually; this constant is the literal string
/// that must appear on whichever transport eventually carries it.
pub const TOPIC_CORPUS_UPDATED: &str = "xkcd.db.updated";

/// Capability interface for publish/subscribe. A real deployment would
/// swap the in-process implementation below for a NATS or AMQP adapter
/// without touching any caller.
pub trait Notifier: Send + Sync {
    fn publish(&self, topic: &str, payload: String);
    fn subscribe(&self, topic: &str) -> broadcast::Receiver<String>;
}

/// In-process broadcast implementation. Since there's only one topic in
/// this service, `topic` is accepted for interface symmetry but not
/// otherwise branched on.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<String>,
}

impl BroadcastNotifier {
    pub fn new() -> Arc<Self> {
        let (sender, _receiver) = broadcast::channel(16);
        Arc::new(Self { sender })
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, _topic: &str, payload: String) {
        // A notification failure is a warning, never a failure of the
        // triggering operation (spec §7) - there's no fallible I/O here,
        // but a send with no subscribers still isn't an error.
        let _ = self.sender.send(payload);
    }

    fn subscribe(&self, _topic: &str) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let notifier = BroadcastNotifier::new();
        let mut rx = notifier.subscribe(TOPIC_CORPUS_UPDATED);
        notifier.publish(TOPIC_CORPUS_UPDATED, "db updated".to_string());
        let received = rx.recv().await.unwrap();
        assert_eq!(received, "db updated");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let notifier = BroadcastNotifier::new();
        notifier.publish(TOPIC_CORPUS_UPDATED, "db updated".to_string());
    }

    #[test]
    fn topic_name_matches_wire_contract() {
        assert_eq!(TOPIC_CORPUS_UPDATED, "xkcd.db.updated");
    }
}
