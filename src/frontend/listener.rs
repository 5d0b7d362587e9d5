use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{Instrument, error, info, info_span};

use crate::backend::{RpcTransport, ZmqReqTransport};
use crate::config::SessionMode;
use crate::frontend::connection::FrontendConnection;
use crate::gateway::Dispatcher;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const LISTEN_BACKLOG: u32 = 1024;

// -----------------------------------------------------------------------------
// ----- GatewayListener -------------------------------------------------------

/// Accept loop for legacy clients.
pub struct GatewayListener<T = ZmqReqTransport> {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<T>>,
    mode: SessionMode,
}

// -----------------------------------------------------------------------------
// ----- GatewayListener: Static -----------------------------------------------

impl<T: RpcTransport> GatewayListener<T> {
    pub async fn bind(
        addr: SocketAddr,
        dispatcher: Arc<Dispatcher<T>>,
        mode: SessionMode,
    ) -> std::io::Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;

        let listener = socket.listen(LISTEN_BACKLOG)?;

        Ok(Self {
            listener,
            dispatcher,
            mode,
        })
    }
}

// -----------------------------------------------------------------------------
// ----- GatewayListener: Public -----------------------------------------------

impl<T: RpcTransport> GatewayListener<T> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// In `Exclusive` mode returns once the first session has ended; in
    /// `Concurrent` mode never returns.
    pub async fn run(self) -> std::io::Result<()> {
        info!(
            "accepting legacy clients on {} ({:?} sessions)",
            self.local_addr()?,
            self.mode
        );

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(v) => v,
                Err(e) => {
                    error!("accept error: {e}");
                    continue;
                }
            };

            let _ = stream.set_nodelay(true);
            info!("client {peer} connected");

            match self.mode {
                SessionMode::Exclusive => {
                    serve_session(stream, peer, self.dispatcher.clone()).await;
                    info!("exclusive session finished; no longer accepting");
                    return Ok(());
                }
                SessionMode::Concurrent => {
                    tokio::spawn(serve_session(stream, peer, self.dispatcher.clone()));
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

async fn serve_session<T: RpcTransport>(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher<T>>,
) {
    let span = info_span!("session", %peer);

    async move {
        let conn = FrontendConnection::new(stream, dispatcher);
        if let Err(e) = conn.serve().await {
            error!("client {peer} error: {e}");
        }
    }
    .instrument(span)
    .await
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
