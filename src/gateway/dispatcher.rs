use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::backend::messages::{Annotation, RankedItem};
use crate::backend::{BackendClient, CallMode, RpcTransport, ZmqReqTransport};
use crate::errors::DispatchError;

use super::registry::QueryRegistry;
use super::request::Request;
use super::response::Response;

// -----------------------------------------------------------------------------
// ----- Dispatcher ------------------------------------------------------------

/// Turns legacy requests into backend calls.
///
/// Shared by every session; the registry and the backend channel do their own
/// locking.
#[derive(Debug)]
pub struct Dispatcher<T = ZmqReqTransport> {
    backend: Arc<BackendClient<T>>,
    registry: QueryRegistry,
    dataset_base: PathBuf,
}

// -----------------------------------------------------------------------------
// ----- Dispatcher: Static ----------------------------------------------------

impl<T: RpcTransport> Dispatcher<T> {
    pub fn new(backend: Arc<BackendClient<T>>, registry: QueryRegistry) -> Self {
        Self {
            backend,
            registry,
            dataset_base: PathBuf::new(),
        }
    }

    /// Directory ranked paths are relative to; used to build `image`.
    pub fn with_dataset_base(mut self, dataset_base: impl Into<PathBuf>) -> Self {
        self.dataset_base = dataset_base.into();
        self
    }
}

// -----------------------------------------------------------------------------
// ----- Dispatcher: Public ----------------------------------------------------

impl<T: RpcTransport> Dispatcher<T> {
    /// Never fails: every error becomes a `success: false` response here and
    /// nowhere else.
    pub async fn handle_payload(&self, payload: &[u8]) -> Response {
        let result = match Request::from_slice(payload) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                if e.is_user_error() {
                    warn!("request failed: {e}");
                } else {
                    error!("handling error with err_msg: {e}");
                }
                Response::failure(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        debug!("dispatching {request:?}");

        match request {
            Request::SelfTest => Ok(Response::ok()),
            Request::GetQueryId => self.get_query_id().await,
            Request::ReleaseQueryId { query_id } => self.release_query_id(query_id).await,
            Request::AddPosTrs {
                query_id,
                impath,
                mode,
            } => self.add_pos_trs(query_id, &impath, mode).await,
            Request::AddNegTrs => {
                warn!("addNegTrs is not supported; ignoring");
                Ok(Response::ok())
            }
            Request::SaveAnnotations { query_id, filepath } => {
                self.save_annotations(query_id, &filepath).await
            }
            Request::GetAnnotations { filepath } => self.get_annotations(&filepath).await,
            Request::LoadAnnotationsAndTrs => Err(DispatchError::Unsupported("loadAnnotationsAndTrs")),
            Request::SaveClassifier { query_id, filepath } => {
                self.save_classifier(query_id, &filepath).await
            }
            Request::LoadClassifier { query_id, filepath } => {
                self.load_classifier(query_id, &filepath).await
            }
            Request::Train { query_id } => self.train(query_id).await,
            Request::Rank { query_id } => self.rank(query_id).await,
            Request::GetRanking { query_id } => self.get_ranking(query_id).await,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Dispatcher: Handlers --------------------------------------------------

impl<T: RpcTransport> Dispatcher<T> {
    async fn get_query_id(&self) -> Result<Response, DispatchError> {
        let query_id = self.registry.allocate(&self.backend).await?;
        Ok(Response::ok().with("query_id", query_id))
    }

    async fn release_query_id(&self, query_id: u64) -> Result<Response, DispatchError> {
        self.registry.release(query_id, &self.backend).await?;
        Ok(Response::ok())
    }

    async fn add_pos_trs(
        &self,
        query_id: u64,
        impath: &str,
        mode: CallMode,
    ) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend
            .add_trs_from_file(&backend_id, impath, mode)
            .await?;
        Ok(Response::ok())
    }

    async fn save_annotations(&self, query_id: u64, filepath: &str) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend.save_annotations(&backend_id, filepath).await?;
        Ok(Response::ok())
    }

    async fn get_annotations(&self, filepath: &str) -> Result<Response, DispatchError> {
        let annotations = self.backend.get_annotations(filepath).await?;
        let list: Vec<Value> = annotations.iter().map(annotation_json).collect();
        Ok(Response::ok().with("annotations", list))
    }

    async fn save_classifier(&self, query_id: u64, filepath: &str) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend.save_classifier(&backend_id, filepath).await?;
        Ok(Response::ok())
    }

    async fn load_classifier(&self, query_id: u64, filepath: &str) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend.load_classifier(&backend_id, filepath).await?;
        Ok(Response::ok())
    }

    async fn train(&self, query_id: u64) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend.train(&backend_id, CallMode::Blocking).await?;
        Ok(Response::ok())
    }

    async fn rank(&self, query_id: u64) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        self.backend.rank(&backend_id, CallMode::Blocking).await?;
        Ok(Response::ok())
    }

    async fn get_ranking(&self, query_id: u64) -> Result<Response, DispatchError> {
        let backend_id = self.registry.resolve(query_id)?;
        let ranking = self.backend.get_ranking(&backend_id, 1).await?;

        let ranklist: Vec<Value> = ranking
            .rlist
            .iter()
            .map(|item| ranked_item_json(&self.dataset_base, item))
            .collect();
        let total_len = ranklist.len();

        Ok(Response::ok()
            .with("ranklist", ranklist)
            .with("total_len", total_len))
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

fn ranked_item_json(dataset_base: &Path, item: &RankedItem) -> Value {
    let image = dataset_base.join(&item.path);
    let uri = Path::new(&item.path).with_extension("");

    json!({
        "image": image.to_string_lossy(),
        "score": item.score,
        "uri": uri.to_string_lossy(),
        "path": item.path,
    })
}

fn annotation_json(annotation: &Annotation) -> Value {
    json!({
        "path": annotation.path,
        "anno": annotation.anno,
    })
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
