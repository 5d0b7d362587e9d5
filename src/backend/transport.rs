use bytes::Bytes;
use std::future::Future;
use tracing::{debug, info};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use super::error::BackendError;

// -----------------------------------------------------------------------------
// ----- RpcTransport ----------------------------------------------------------

/// One request in, exactly one reply out.
///
/// Implementations may assume they are never entered twice concurrently; the
/// client serializes access.
pub trait RpcTransport: Send + 'static {
    fn round_trip(
        &mut self,
        request: Bytes,
    ) -> impl Future<Output = Result<Bytes, BackendError>> + Send;
}

// -----------------------------------------------------------------------------
// ----- ZmqReqTransport -------------------------------------------------------

pub struct ZmqReqTransport {
    socket: ReqSocket,
    endpoint: String,
}

impl ZmqReqTransport {
    pub async fn connect(endpoint: &str) -> Result<Self, BackendError> {
        let mut socket = ReqSocket::new();
        socket.connect(endpoint).await?;

        info!("connected to backend at {endpoint}");

        Ok(Self {
            socket,
            endpoint: endpoint.to_string(),
        })
    }
}

impl RpcTransport for ZmqReqTransport {
    fn round_trip(
        &mut self,
        request: Bytes,
    ) -> impl Future<Output = Result<Bytes, BackendError>> + Send {
        async move {
            debug!("-> backend {} ({} bytes)", self.endpoint, request.len());
            self.socket.send(ZmqMessage::from(request)).await?;

            let reply = self.socket.recv().await?;
            let frame = reply.into_vec().into_iter().next().ok_or(BackendError::EmptyReply)?;
            debug!("<- backend {} ({} bytes)", self.endpoint, frame.len());

            Ok(frame)
        }
    }
}

impl std::fmt::Debug for ZmqReqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZmqReqTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
