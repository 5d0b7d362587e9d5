pub mod connection;
pub mod listener;

pub(crate) mod buffers;
pub(crate) mod transport;

pub use connection::{FrontendConnection, SessionState};
pub use listener::GatewayListener;
