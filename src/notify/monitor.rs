use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{
    error::NotifyError,
    notification::Notification,
    source::{NotificationSource, ZmqSubSource},
    subscribers::Subscribers,
};

// -----------------------------------------------------------------------------
// ----- NotificationMonitor ---------------------------------------------------

/// Reads backend notifications and fans them out to subscribers.
#[derive(Debug)]
pub struct NotificationMonitor<S = ZmqSubSource> {
    source: S,
    subscribers: Subscribers,
}

// -----------------------------------------------------------------------------
// ----- NotificationMonitor: Static -------------------------------------------

impl<S: NotificationSource> NotificationMonitor<S> {
    pub fn new(source: S, subscribers: Subscribers) -> Self {
        Self {
            source,
            subscribers,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- NotificationMonitor: Public -------------------------------------------

impl<S: NotificationSource> NotificationMonitor<S> {
    /// Runs until the source ends (`Ok`) or its transport fails (`Err`).
    /// Bad individual messages are logged and skipped.
    pub async fn run(mut self) -> Result<(), NotifyError> {
        loop {
            let raw = match self.source.next_message().await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    info!("notification stream closed");
                    return Ok(());
                }
                Err(e) => {
                    error!("notification monitor stopped: {e}");
                    return Err(e);
                }
            };

            match Notification::decode(&raw) {
                Ok(n) => {
                    debug!("notification {} ({} bytes)", n.label(), raw.len());
                    self.subscribers.publish(&n);
                }
                Err(e) if e.is_skippable() => warn!("skipping notification: {e}"),
                Err(e) => return Err(e),
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<(), NotifyError>> {
        tokio::spawn(self.run())
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
