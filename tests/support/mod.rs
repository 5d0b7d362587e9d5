use bytes::Bytes;
use parking_lot::Mutex;
use prost::Message;
use serde_json::Value;
use std::{collections::HashSet, future::Future, net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};

use visorgate::backend::messages::{RankedItem, RankedList, RpcReply, RpcRequest};
use visorgate::backend::{BackendClient, BackendError, RpcTransport};
use visorgate::config::SessionMode;
use visorgate::{Dispatcher, GatewayListener, QueryRegistry};

pub const TERMINATOR: &[u8] = b"$$$";

// -----------------------------------------------------------------------------
// ----- In-memory backend -----------------------------------------------------

/// Minimal stand-in for the visual search backend. Tracks live query ids
/// and the request strings it has seen.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    issued: u32,
    live: HashSet<String>,
    seen: Vec<String>,
}

#[allow(dead_code)]
impl MemoryBackend {
    pub fn seen(&self) -> Vec<String> {
        self.state.lock().seen.clone()
    }

    pub fn live(&self) -> usize {
        self.state.lock().live.len()
    }

    fn reply_to(&self, req: RpcRequest) -> RpcReply {
        let mut st = self.state.lock();
        st.seen.push(req.request_string.clone());

        match req.request_string.as_str() {
            "start_query" => {
                st.issued += 1;
                let id = format!("b{}", st.issued);
                st.live.insert(id.clone());
                RpcReply {
                    id,
                    ..RpcReply::ok()
                }
            }
            _ if !st.live.contains(&req.id) => RpcReply::failed("unknown backend query"),
            "free_query" => {
                st.live.remove(&req.id);
                RpcReply::ok()
            }
            "get_ranking" => RpcReply {
                ranking: Some(RankedList {
                    rlist: vec![
                        RankedItem {
                            path: "bikes/12.jpg".into(),
                            score: 3.0,
                        },
                        RankedItem {
                            path: "bikes/07.jpg".into(),
                            score: 1.5,
                        },
                    ],
                    page: req.retrieve_page,
                    page_count: 1,
                }),
                ..RpcReply::ok()
            },
            _ => RpcReply::ok(),
        }
    }
}

impl RpcTransport for MemoryBackend {
    fn round_trip(
        &mut self,
        request: Bytes,
    ) -> impl Future<Output = Result<Bytes, BackendError>> + Send {
        let backend = self.clone();
        async move {
            let req = RpcRequest::decode(request)?;
            Ok(Bytes::from(backend.reply_to(req).encode_to_vec()))
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Gateway ---------------------------------------------------------------

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub backend: MemoryBackend,
    pub task: JoinHandle<std::io::Result<()>>,
}

pub async fn start_gateway(mode: SessionMode) -> RunningGateway {
    let backend = MemoryBackend::default();
    let client = Arc::new(BackendClient::new(backend.clone()));
    let dispatcher = Dispatcher::new(client, QueryRegistry::new()).with_dataset_base("/srv/dataset");

    let listener = GatewayListener::bind("127.0.0.1:0".parse().unwrap(), Arc::new(dispatcher), mode)
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(listener.run());

    RunningGateway {
        addr,
        backend,
        task,
    }
}

// -----------------------------------------------------------------------------
// ----- Legacy client ---------------------------------------------------------

pub struct LegacyClient {
    stream: TcpStream,
    pending: Vec<u8>,
}

#[allow(dead_code)]
impl LegacyClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect gateway");
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    pub async fn call(&mut self, json: &str) -> Value {
        self.send_raw(json.as_bytes()).await;
        self.send_raw(TERMINATOR).await;
        self.reply().await
    }

    pub async fn reply(&mut self) -> Value {
        loop {
            if let Some(pos) = find(&self.pending, TERMINATOR) {
                let frame: Vec<u8> = self.pending.drain(..pos + TERMINATOR.len()).collect();
                return serde_json::from_slice(&frame[..pos]).expect("reply is json");
            }

            let mut buf = [0u8; 1024];
            let n = self.stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "gateway closed the connection");
            self.pending.extend_from_slice(&buf[..n]);
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
