//! In-memory stand-in for the search backend used by unit tests.

use bytes::Bytes;
use parking_lot::Mutex;
use prost::Message;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use super::error::BackendError;
use super::messages::{Annotation, RankedItem, RankedList, RpcReply, RpcRequest};
use super::transport::RpcTransport;

// -----------------------------------------------------------------------------
// ----- FakeBackend -----------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Default)]
struct FakeState {
    issued: u32,
    live: HashSet<String>,
    requests: Vec<RpcRequest>,
    in_flight: usize,
    max_in_flight: usize,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn request_strings(&self) -> Vec<String> {
        let state = self.state.lock();
        state.requests.iter().map(|r| r.request_string.clone()).collect()
    }

    pub(crate) fn last_request(&self) -> Option<RpcRequest> {
        self.state.lock().requests.last().cloned()
    }

    pub(crate) fn live_queries(&self) -> usize {
        self.state.lock().live.len()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    fn reply_to(&self, req: RpcRequest) -> RpcReply {
        let mut state = self.state.lock();
        state.requests.push(req.clone());

        match req.request_string.as_str() {
            "start_query" => {
                state.issued += 1;
                let id = format!("q-{}", state.issued);
                state.live.insert(id.clone());
                RpcReply {
                    id,
                    ..RpcReply::ok()
                }
            }

            "get_annotations" => RpcReply {
                annotations: vec![
                    Annotation {
                        path: "cars/001.jpg".into(),
                        anno: 1,
                    },
                    Annotation {
                        path: "cars/002.jpg".into(),
                        anno: -1,
                    },
                ],
                ..RpcReply::ok()
            },

            "add_dset_images_to_index" => RpcReply::ok(),

            _ if !state.live.contains(&req.id) => {
                RpcReply::failed("Request was invalid: unknown query id")
            }

            "free_query" => {
                state.live.remove(&req.id);
                RpcReply::ok()
            }

            "get_ranking" | "train_rank_get_ranking" => RpcReply {
                ranking: Some(sample_ranking(req.retrieve_page)),
                ..RpcReply::ok()
            },

            "set_tag" | "add_trs" | "add_trs_from_file"
            | "add_trs_from_file_and_wait" | "train" | "train_and_wait" | "rank"
            | "rank_and_wait" | "save_classifier" | "load_classifier" | "save_annotations" => {
                RpcReply::ok()
            }

            other => RpcReply::failed(format!("Unrecognised function: {other}")),
        }
    }
}

impl RpcTransport for FakeBackend {
    fn round_trip(
        &mut self,
        request: Bytes,
    ) -> impl Future<Output = Result<Bytes, BackendError>> + Send {
        let this = self.clone();
        async move {
            {
                let mut state = this.state.lock();
                state.in_flight += 1;
                state.max_in_flight = state.max_in_flight.max(state.in_flight);
            }

            tokio::task::yield_now().await;

            let req = RpcRequest::decode(request)?;
            let rep = this.reply_to(req);

            this.state.lock().in_flight -= 1;

            Ok(Bytes::from(rep.encode_to_vec()))
        }
    }
}

fn sample_ranking(page: u32) -> RankedList {
    RankedList {
        rlist: vec![
            RankedItem {
                path: "cars/101.jpg".into(),
                score: 2.5,
            },
            RankedItem {
                path: "cars/017.jpg".into(),
                score: 1.25,
            },
            RankedItem {
                path: "misc/900.png".into(),
                score: -0.5,
            },
        ],
        page,
        page_count: 2,
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
