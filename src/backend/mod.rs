//! Backend RPC layer: protobuf messages over a strictly alternating
//! request/reply channel.

pub mod client;
pub mod error;
pub mod messages;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{BackendClient, CallMode};
pub use error::BackendError;
pub use transport::{RpcTransport, ZmqReqTransport};
