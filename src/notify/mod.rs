pub mod error;
pub mod monitor;
pub mod notification;
pub mod source;
pub mod subscribers;

pub use error::NotifyError;
pub use monitor::NotificationMonitor;
pub use notification::Notification;
pub use source::{NotificationSource, ZmqSubSource};
pub use subscribers::{LogConsumer, NotificationConsumer, Subscribers};
