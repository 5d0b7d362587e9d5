use std::io::{Error, ErrorKind};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

// -----------------------------------------------------------------------------
// ----- Writing ---------------------------------------------------------------

/// Writes all of `buf`, one `write` call at a time.
///
/// A write that accepts zero bytes means the peer is gone; that is reported
/// as `WriteZero` and ends the session.
pub(crate) async fn send_all<W>(writer: &mut W, buf: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut total_sent = 0;

    while total_sent < buf.len() {
        let sent = writer.write(&buf[total_sent..]).await?;
        if sent == 0 {
            return Err(Error::new(ErrorKind::WriteZero, "socket connection broken"));
        }

        total_sent += sent;
        trace!("sent {sent} bytes ({total_sent}/{})", buf.len());
    }

    writer.flush().await
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

/// A reset peer is a normal way for a legacy client to hang up.
pub(crate) fn is_peer_reset(e: &Error) -> bool {
    matches!(e.kind(), ErrorKind::ConnectionReset)
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts at most `chunk` bytes per call.
    struct Trickle {
        chunk: usize,
        written: Vec<u8>,
        calls: usize,
    }

    impl AsyncWrite for Trickle {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            let n = buf.len().min(self.chunk);
            self.written.extend_from_slice(&buf[..n]);
            self.calls += 1;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn partial_writes_are_continued() {
        let mut w = Trickle {
            chunk: 4,
            written: Vec::new(),
            calls: 0,
        };

        send_all(&mut w, b"{\"success\":true}$$$").await.unwrap();

        assert_eq!(w.written, b"{\"success\":true}$$$".to_vec());
        assert_eq!(w.calls, 5);
    }

    #[tokio::test]
    async fn zero_byte_write_is_fatal() {
        let mut w = Trickle {
            chunk: 0,
            written: Vec::new(),
            calls: 0,
        };

        let err = send_all(&mut w, b"abc").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
        assert_eq!(w.calls, 1);
    }

    #[test]
    fn reset_is_recognized() {
        assert!(is_peer_reset(&Error::from(ErrorKind::ConnectionReset)));
        assert!(!is_peer_reset(&Error::from(ErrorKind::BrokenPipe)));
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
