// Command layer: JSON requests in, JSON responses out. Framing lives in
// wire_protocol, sockets in frontend.
pub mod dispatcher;
pub mod registry;
pub mod request;
pub mod response;

pub use dispatcher::Dispatcher;
pub use registry::{QueryRegistry, RegistryError};
pub use request::{CommandKind, Request};
pub use response::Response;
