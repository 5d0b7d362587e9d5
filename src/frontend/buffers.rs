use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::frontend::transport::send_all;
use crate::gateway::Response;
use crate::wire_protocol::FrameCodec;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const SCRATCH_CAPACITY_HINT: usize = 4096;

// -----------------------------------------------------------------------------
// ----- FrontendBuffers -------------------------------------------------------

#[derive(Debug)]
pub(crate) struct FrontendBuffers {
    inbox: FrameCodec,
    outbox: BytesMut,
}

impl FrontendBuffers {
    pub(crate) fn new() -> Self {
        Self {
            inbox: FrameCodec::new(),
            outbox: BytesMut::with_capacity(SCRATCH_CAPACITY_HINT),
        }
    }

    pub(crate) async fn read_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        reader.read_buf(self.inbox.inbox_mut()).await
    }

    pub(crate) fn pull_next_frame(&mut self) -> Option<BytesMut> {
        self.inbox.next_frame()
    }

    pub(crate) fn leftover_len(&self) -> usize {
        self.inbox.leftover().len()
    }

    pub(crate) fn is_overflowing(&self) -> bool {
        self.inbox.is_overflowing()
    }

    pub(crate) fn max_frame_len(&self) -> usize {
        self.inbox.max_frame_len()
    }

    pub(crate) fn queue_response(&mut self, response: &Response) {
        self.outbox.extend_from_slice(&response.to_bytes());
    }

    pub(crate) async fn flush_to<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if !self.outbox.is_empty() {
            send_all(writer, &self.outbox).await?;
            self.outbox.clear();
        }

        Ok(())
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
