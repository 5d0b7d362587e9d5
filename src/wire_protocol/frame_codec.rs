//! wire_protocol::frame_codec
//!
//! Terminator-delimited framing used by legacy clients: every message is a
//! UTF-8 JSON payload followed by the literal `$$$`. There is no length prefix
//! and the terminator is never escaped, so a payload that itself contains
//! `$$$` is cut short at that point. Legacy clients depend on this exact
//! layout, so it is kept as is.

use bytes::{BufMut, Bytes, BytesMut};
use memchr::memmem;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

pub const TERMINATOR: &[u8] = b"$$$";

/// Longest unterminated payload a client may leave pending.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

const SCRATCH_CAPACITY_HINT: usize = 4096;

// -----------------------------------------------------------------------------
// ----- FrameCodec ------------------------------------------------------------

/// Accumulates raw bytes from a stream and hands out complete frames.
///
/// Bytes after the last terminator stay in the accumulator as leftovers for
/// the next read cycle.
#[derive(Debug)]
pub struct FrameCodec {
    inbox: BytesMut,

    // Offset before which no terminator can start.
    scanned: usize,

    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_len(MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            inbox: BytesMut::with_capacity(SCRATCH_CAPACITY_HINT),
            scanned: 0,
            max_frame_len,
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// ----- FrameCodec: Public ----------------------------------------------------

impl FrameCodec {
    /// Mutable access for `read_buf` style readers.
    pub fn inbox_mut(&mut self) -> &mut BytesMut {
        self.inbox.reserve(SCRATCH_CAPACITY_HINT);
        &mut self.inbox
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.inbox.extend_from_slice(chunk);
    }

    /// Pops the next complete frame (terminator stripped), if any.
    pub fn next_frame(&mut self) -> Option<BytesMut> {
        let window = &self.inbox[self.scanned..];

        let Some(pos) = memmem::find(window, TERMINATOR) else {
            // a terminator may straddle the end of what we have so far
            self.scanned = self.inbox.len().saturating_sub(TERMINATOR.len() - 1);
            return None;
        };

        let end = self.scanned + pos;
        let mut frame = self.inbox.split_to(end + TERMINATOR.len());
        frame.truncate(end);

        self.scanned = 0;

        Some(frame)
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn leftover(&self) -> &[u8] {
        &self.inbox
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Meaningful once `next_frame` has returned `None`: the pending tail has
    /// no terminator and is already longer than any frame may be.
    pub fn is_overflowing(&self) -> bool {
        self.inbox.len() > self.max_frame_len
    }
}

// -----------------------------------------------------------------------------
// ----- Encoding --------------------------------------------------------------

pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + TERMINATOR.len());
    encode_into(&mut buf, payload);
    buf.freeze()
}

pub fn encode_into(buf: &mut BytesMut, payload: &[u8]) {
    buf.reserve(payload.len() + TERMINATOR.len());
    buf.put_slice(payload);
    buf.put_slice(TERMINATOR);
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
