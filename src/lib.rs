pub mod backend;
pub mod config;
pub mod errors;
pub mod frontend;
pub mod gateway;
pub mod notify;
pub mod wire_protocol;

pub use backend::{BackendClient, RpcTransport};
pub use config::Config;
pub use frontend::{FrontendConnection, GatewayListener};
pub use gateway::{Dispatcher, QueryRegistry};
