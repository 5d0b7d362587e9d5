use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use visorgate::{
    BackendClient, Config, Dispatcher, GatewayListener, QueryRegistry,
    notify::{LogConsumer, NotificationMonitor, Subscribers, ZmqSubSource},
};

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const APP_NAME: &str = "visorgate";

// -----------------------------------------------------------------------------
// ----- Main ------------------------------------------------------------------

#[tokio::main]
async fn main() -> std::io::Result<()> {
    setup().await;
    run_until_done().await
}

// -----------------------------------------------------------------------------
// ----- Setup -----------------------------------------------------------------

async fn setup() {
    // Config first; logging depends on it.
    Config::init().await;

    init_tracing();
}

fn init_tracing() {
    let config = Config::snapshot();
    let filter = EnvFilter::try_new(config.log_level.as_str())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

async fn start_monitor(endpoint: &str) {
    let source = match ZmqSubSource::connect(endpoint).await {
        Ok(source) => source,
        Err(e) => {
            warn!("notifications disabled; cannot subscribe to {endpoint}: {e}");
            return;
        }
    };

    let subscribers = Subscribers::new();
    subscribers.subscribe(LogConsumer);

    NotificationMonitor::new(source, subscribers).spawn();
}

// -----------------------------------------------------------------------------
// ----- Run -------------------------------------------------------------------

async fn run_until_done() -> std::io::Result<()> {
    let config = Config::snapshot();
    let settings = &config.settings;

    let backend = BackendClient::connect(&settings.server_endpoint)
        .await
        .map_err(std::io::Error::other)?;

    if let Some(endpoint) = settings.notify_endpoint.as_deref() {
        start_monitor(endpoint).await;
    }

    let dispatcher = Dispatcher::new(Arc::new(backend), QueryRegistry::new())
        .with_dataset_base(settings.dataset_im_base_path.clone());

    let listener =
        GatewayListener::bind(config.listen_addr, Arc::new(dispatcher), config.session_mode)
            .await?;

    info!("{} listening on {}", APP_NAME, config.listen_addr);

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("{} shutting down", APP_NAME);
        }

        res = listener.run() => {
            if let Err(e) = &res {
                error!("listener stopped: {e}");
            }
            res?;
            info!("{} done", APP_NAME);
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
