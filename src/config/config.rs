use parking_lot::RwLock;
use std::{
    net::SocketAddr,
    sync::{Arc, OnceLock},
};

use super::{
    cli::CliConfig,
    settings::Settings,
    types::{LogLevel, SessionMode},
};

// -----------------------------------------------------------------------------
// ----- Global Singleton ------------------------------------------------------

static ROOT_CONFIG: OnceLock<Arc<RwLock<Config>>> = OnceLock::new();

// -----------------------------------------------------------------------------
// ----- Config ----------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub session_mode: SessionMode,
    pub log_level: LogLevel,
    pub settings: Settings,
}

// -----------------------------------------------------------------------------
// ----- Config: Static --------------------------------------------------------

impl Config {
    /// Async because the settings file is read with non-blocking IO.
    /// Panics on a bad CLI or settings file; there is no sane way to run.
    pub async fn init() {
        CliConfig::init();

        Self::load().await;
    }

    pub fn snapshot() -> Config {
        Self::handle().read().clone()
    }
}

// -----------------------------------------------------------------------------
// ----- Config: Private -------------------------------------------------------

impl Config {
    async fn load() {
        let cli = CliConfig::snapshot();

        let settings = Settings::from_file_async(&cli.settings_file_location)
            .await
            .unwrap_or_else(|e| {
                panic!(
                    "failed to load settings from {:?}: {e}",
                    cli.settings_file_location
                )
            });

        let next = Config {
            listen_addr: cli.listen_addr,
            session_mode: cli.session_mode,
            log_level: cli.log_level,
            settings,
        };

        let _ = ROOT_CONFIG.set(Arc::new(RwLock::new(next)));
    }

    fn handle() -> Arc<RwLock<Config>> {
        ROOT_CONFIG
            .get()
            .expect("Config not initialized; call Config::init().await first")
            .clone()
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
