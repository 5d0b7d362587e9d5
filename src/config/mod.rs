mod cli;
#[allow(clippy::module_inception)]
mod config;
mod settings;
mod types;

pub use config::Config;
pub use settings::{Settings, SettingsError};
pub use types::{LogLevel, SessionMode};
