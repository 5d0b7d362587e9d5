use bytes::Bytes;
use std::future::Future;
use tracing::info;
use zeromq::{Socket, SocketRecv, SubSocket};

use super::error::NotifyError;

// -----------------------------------------------------------------------------
// ----- NotificationSource ----------------------------------------------------

/// A stream of raw notification payloads. `Ok(None)` means the stream ended.
pub trait NotificationSource: Send + 'static {
    fn next_message(&mut self) -> impl Future<Output = Result<Option<Bytes>, NotifyError>> + Send;
}

// -----------------------------------------------------------------------------
// ----- ZmqSubSource ----------------------------------------------------------

pub struct ZmqSubSource {
    socket: SubSocket,
    endpoint: String,
}

impl ZmqSubSource {
    /// Connects and subscribes to every topic.
    pub async fn connect(endpoint: &str) -> Result<Self, NotifyError> {
        let mut socket = SubSocket::new();
        socket.connect(endpoint).await?;
        socket.subscribe("").await?;

        info!("subscribed to backend notifications at {endpoint}");

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }
}

impl NotificationSource for ZmqSubSource {
    fn next_message(&mut self) -> impl Future<Output = Result<Option<Bytes>, NotifyError>> + Send {
        async move {
            let msg = self.socket.recv().await?;
            Ok(msg.into_vec().into_iter().next())
        }
    }
}

impl std::fmt::Debug for ZmqSubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqSubSource")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
