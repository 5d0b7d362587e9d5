pub mod frame_codec;

pub use frame_codec::{FrameCodec, MAX_FRAME_LEN, TERMINATOR, encode};
