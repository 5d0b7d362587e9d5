use parking_lot::RwLock;
use smallvec::SmallVec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::notification::Notification;
use crate::backend::messages::NotificationType;

// -----------------------------------------------------------------------------
// ----- NotificationConsumer --------------------------------------------------

pub trait NotificationConsumer: Send + Sync + 'static {
    fn consume(&self, notification: &Notification);
}

impl<F> NotificationConsumer for F
where
    F: Fn(&Notification) + Send + Sync + 'static,
{
    fn consume(&self, notification: &Notification) {
        self(notification)
    }
}

/// Writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConsumer;

impl NotificationConsumer for LogConsumer {
    fn consume(&self, n: &Notification) {
        let query = n.query_id.as_deref().unwrap_or("-");

        match n.kind {
            NotificationType::Error => {
                warn!("backend notification [{}] query={} {}", n.label(), query, n.data)
            }
            _ => info!("backend notification [{}] query={} {}", n.label(), query, n.data),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Subscribers -----------------------------------------------------------

type ConsumerList = SmallVec<[Arc<dyn NotificationConsumer>; 4]>;

/// Shared list of consumers. Cloning shares the list.
#[derive(Clone, Default)]
pub struct Subscribers {
    consumers: Arc<RwLock<ConsumerList>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, consumer: impl NotificationConsumer) {
        self.consumers.write().push(Arc::new(consumer));
    }

    /// Subscribes a channel and hands back its receiving end. A dropped
    /// receiver just stops receiving.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(move |n: &Notification| {
            let _ = tx.send(n.clone());
        });
        rx
    }

    pub fn len(&self) -> usize {
        self.consumers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers to every consumer in subscription order.
    pub fn publish(&self, notification: &Notification) {
        let consumers: ConsumerList = self.consumers.read().iter().cloned().collect();
        for consumer in consumers {
            consumer.consume(notification);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("consumers", &self.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn note(data: &str) -> Notification {
        Notification {
            kind: NotificationType::ImageProcessed,
            query_id: Some("q-1".into()),
            data: data.into(),
        }
    }

    #[test]
    fn every_consumer_sees_each_notification_in_order() {
        let subs = Subscribers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = seen.clone();
            subs.subscribe(move |n: &Notification| seen.lock().push(format!("{tag}:{}", n.data)));
        }

        subs.publish(&note("1"));
        subs.publish(&note("2"));

        assert_eq!(*seen.lock(), vec!["a:1", "b:1", "a:2", "b:2"]);
    }

    #[tokio::test]
    async fn channel_receives_clones() {
        let subs = Subscribers::new();
        let mut rx = subs.channel();

        subs.publish(&note("cars/001.jpg"));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.data, "cars/001.jpg");
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn dropped_channel_does_not_break_publish() {
        let subs = Subscribers::new();
        drop(subs.channel());
        subs.subscribe(LogConsumer);

        subs.publish(&note("x"));
        assert_eq!(subs.len(), 2);
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
