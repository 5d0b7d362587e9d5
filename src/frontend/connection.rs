use std::io::{Error, ErrorKind};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::backend::{RpcTransport, ZmqReqTransport};
use crate::frontend::buffers::FrontendBuffers;
use crate::frontend::transport::is_peer_reset;
use crate::gateway::{Dispatcher, Response};

// -----------------------------------------------------------------------------
// ----- SessionState ----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,   // waiting for (more of) a frame
    Dispatching, // a complete request is being handled
    Closed,
}

// -----------------------------------------------------------------------------
// ----- FrontendConnection ----------------------------------------------------

/// One legacy client. Requests are handled strictly one at a time: the reply
/// to a request is fully written before the next frame is looked at.
pub struct FrontendConnection<S = TcpStream, T = ZmqReqTransport> {
    state: SessionState,
    stream: S,
    buffers: FrontendBuffers,
    dispatcher: Arc<Dispatcher<T>>,
}

// -----------------------------------------------------------------------------
// ----- FrontendConnection: Static --------------------------------------------

impl<S, T> FrontendConnection<S, T>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: RpcTransport,
{
    pub fn new(stream: S, dispatcher: Arc<Dispatcher<T>>) -> Self {
        Self {
            state: SessionState::Connected,
            stream,
            buffers: FrontendBuffers::new(),
            dispatcher,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- FrontendConnection: Public --------------------------------------------

impl<S, T> FrontendConnection<S, T>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: RpcTransport,
{
    /// Runs until the peer hangs up. Only transport failures other than a
    /// reset come back as errors; request failures are answered in-band.
    pub async fn serve(mut self) -> std::io::Result<()> {
        let result = self.run_cycles().await;
        self.transition(SessionState::Closed);

        let _ = self.stream.shutdown().await;

        match result {
            Err(e) if is_peer_reset(&e) => {
                info!("connection reset; ending session");
                Ok(())
            }
            other => other,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

// -----------------------------------------------------------------------------
// ----- FrontendConnection: Private -------------------------------------------

impl<S, T> FrontendConnection<S, T>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: RpcTransport,
{
    async fn run_cycles(&mut self) -> std::io::Result<()> {
        loop {
            let n = self.buffers.read_from(&mut self.stream).await?;
            if n == 0 {
                if self.buffers.leftover_len() > 0 {
                    debug!(
                        "dropping {} bytes of unterminated input",
                        self.buffers.leftover_len()
                    );
                }
                info!("connection closed; ending session");
                return Ok(());
            }

            while let Some(frame) = self.buffers.pull_next_frame() {
                self.transition(SessionState::Dispatching);
                debug!("received request: {}", String::from_utf8_lossy(&frame));

                let response = self.dispatcher.handle_payload(&frame).await;

                self.buffers.queue_response(&response);
                self.buffers.flush_to(&mut self.stream).await?;
                debug!("response sent (success={})", response.success);

                self.transition(SessionState::Connected);
            }

            if self.buffers.is_overflowing() {
                return self.reject_oversized().await;
            }
        }
    }

    /// No terminator within the frame limit; the stream cannot be resynced.
    async fn reject_oversized(&mut self) -> std::io::Result<()> {
        let limit = self.buffers.max_frame_len();
        warn!("request exceeds {limit} bytes without terminator; closing session");

        let response =
            Response::failure(format!("request exceeds {limit} bytes without terminator"));
        self.buffers.queue_response(&response);
        self.buffers.flush_to(&mut self.stream).await?;

        Err(Error::new(ErrorKind::InvalidData, "request too long"))
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::trace!("session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
