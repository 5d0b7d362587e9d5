use bytes::Bytes;
use prost::Message;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::BackendError;
use super::messages::{Annotation, RankedList, RpcReply, RpcRequest};
use super::transport::{RpcTransport, ZmqReqTransport};

// -----------------------------------------------------------------------------
// ----- CallMode --------------------------------------------------------------

/// Whether the backend should finish the work before replying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Blocking,
    NonBlocking,
}

impl CallMode {
    fn request_string(self, base: &str) -> String {
        match self {
            CallMode::Blocking => format!("{base}_and_wait"),
            CallMode::NonBlocking => base.to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient ---------------------------------------------------------

/// Process-wide handle on the single backend RPC channel.
///
/// The channel lock is held from send until the reply has been received, so
/// concurrent callers queue up and the request/reply alternation is never
/// broken.
#[derive(Debug)]
pub struct BackendClient<T = ZmqReqTransport> {
    channel: Mutex<T>,
}

impl<T: RpcTransport> BackendClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            channel: Mutex::new(transport),
        }
    }
}

impl BackendClient<ZmqReqTransport> {
    pub async fn connect(endpoint: &str) -> Result<Self, BackendError> {
        let transport = ZmqReqTransport::connect(endpoint).await?;
        Ok(Self::new(transport))
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient: Query lifecycle ----------------------------------------

impl<T: RpcTransport> BackendClient<T> {
    /// Returns the backend-issued query id.
    pub async fn start_query(&self, tag: Option<&str>) -> Result<String, BackendError> {
        let mut req = RpcRequest::named("start_query");
        if let Some(tag) = tag {
            req.tag = tag.to_string();
        }

        let rep = self.call(req).await?;
        if rep.id.is_empty() {
            return Err(BackendError::MissingField("id"));
        }

        Ok(rep.id)
    }

    pub async fn set_tag(&self, query_id: &str, tag: &str) -> Result<(), BackendError> {
        let mut req = RpcRequest::for_query("set_tag", query_id);
        req.tag = tag.to_string();
        self.call(req).await.map(drop)
    }

    pub async fn free_query(&self, query_id: &str) -> Result<(), BackendError> {
        self.call(RpcRequest::for_query("free_query", query_id))
            .await
            .map(drop)
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient: Training data ------------------------------------------

impl<T: RpcTransport> BackendClient<T> {
    /// Non-blocking only; the backend has no waiting variant of `add_trs`.
    pub async fn add_trs_from_urls(
        &self,
        query_id: &str,
        urls: Vec<String>,
    ) -> Result<(), BackendError> {
        let req = RpcRequest::for_query("add_trs", query_id).with_urls(urls);
        self.call(req).await.map(drop)
    }

    /// The backend reads the image straight from its local filesystem.
    pub async fn add_trs_from_file(
        &self,
        query_id: &str,
        path: &str,
        mode: CallMode,
    ) -> Result<(), BackendError> {
        let req = RpcRequest::for_query(&mode.request_string("add_trs_from_file"), query_id)
            .with_urls(vec![path.to_string()]);
        self.call(req).await.map(drop)
    }

    pub async fn add_dset_images_to_index(&self, paths: Vec<String>) -> Result<(), BackendError> {
        let mut req = RpcRequest::named("add_dset_images_to_index");
        req.paths = paths;
        self.call(req).await.map(drop)
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient: Training and ranking -----------------------------------

impl<T: RpcTransport> BackendClient<T> {
    pub async fn train(&self, query_id: &str, mode: CallMode) -> Result<(), BackendError> {
        let req = RpcRequest::for_query(&mode.request_string("train"), query_id);
        self.call(req).await.map(drop)
    }

    pub async fn rank(&self, query_id: &str, mode: CallMode) -> Result<(), BackendError> {
        let req = RpcRequest::for_query(&mode.request_string("rank"), query_id);
        self.call(req).await.map(drop)
    }

    /// Blocks until training and ranking are done, then returns the first page.
    pub async fn train_rank_get_ranking(&self, query_id: &str) -> Result<RankedList, BackendError> {
        let mut req = RpcRequest::for_query("train_rank_get_ranking", query_id);
        req.retrieve_page = 1;
        self.ranking_call(req).await
    }

    /// Pages are 1-based.
    pub async fn get_ranking(&self, query_id: &str, page: u32) -> Result<RankedList, BackendError> {
        let mut req = RpcRequest::for_query("get_ranking", query_id);
        req.retrieve_page = page;
        self.ranking_call(req).await
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient: Persistence --------------------------------------------

impl<T: RpcTransport> BackendClient<T> {
    pub async fn save_classifier(&self, query_id: &str, filepath: &str) -> Result<(), BackendError> {
        let req = RpcRequest::for_query("save_classifier", query_id).with_filepath(filepath);
        self.call(req).await.map(drop)
    }

    pub async fn load_classifier(&self, query_id: &str, filepath: &str) -> Result<(), BackendError> {
        let req = RpcRequest::for_query("load_classifier", query_id).with_filepath(filepath);
        self.call(req).await.map(drop)
    }

    pub async fn save_annotations(&self, query_id: &str, filepath: &str) -> Result<(), BackendError> {
        let req = RpcRequest::for_query("save_annotations", query_id).with_filepath(filepath);
        self.call(req).await.map(drop)
    }

    pub async fn get_annotations(&self, filepath: &str) -> Result<Vec<Annotation>, BackendError> {
        let req = RpcRequest::named("get_annotations").with_filepath(filepath);
        let rep = self.call(req).await?;
        Ok(rep.annotations)
    }
}

// -----------------------------------------------------------------------------
// ----- BackendClient: Private ------------------------------------------------

impl<T: RpcTransport> BackendClient<T> {
    async fn ranking_call(&self, req: RpcRequest) -> Result<RankedList, BackendError> {
        let rep = self.call(req).await?;
        rep.ranking.ok_or(BackendError::MissingField("ranking"))
    }

    async fn call(&self, req: RpcRequest) -> Result<RpcReply, BackendError> {
        debug!("REQ: {} (id={:?})", req.request_string, req.id);

        let payload = Bytes::from(req.encode_to_vec());

        let raw = {
            let mut channel = self.channel.lock().await;
            channel.round_trip(payload).await?
        };

        let rep = RpcReply::decode(raw)?;
        if !rep.success {
            warn!("backend rejected {}: {}", req.request_string, rep.err_msg);
            return Err(BackendError::Rejected(rep.err_msg));
        }

        Ok(rep)
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;

    #[tokio::test]
    async fn start_query_returns_backend_id() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());

        let id = client.start_query(None).await.unwrap();
        assert_eq!(id, "q-1");
        assert_eq!(fake.request_strings(), vec!["start_query"]);
    }

    #[tokio::test]
    async fn call_mode_picks_request_string() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(Some("car")).await.unwrap();

        client.train(&id, CallMode::NonBlocking).await.unwrap();
        client.train(&id, CallMode::Blocking).await.unwrap();
        client.rank(&id, CallMode::Blocking).await.unwrap();
        client
            .add_trs_from_file(&id, "/tmp/a.jpg", CallMode::Blocking)
            .await
            .unwrap();
        client
            .add_trs_from_urls(&id, vec!["http://x/1.jpg".into()])
            .await
            .unwrap();

        assert_eq!(
            fake.request_strings(),
            vec![
                "start_query",
                "train",
                "train_and_wait",
                "rank_and_wait",
                "add_trs_from_file_and_wait",
                "add_trs",
            ]
        );

        let last = fake.last_request().unwrap();
        assert_eq!(last.train_image_urls.unwrap().urls, vec!["http://x/1.jpg"]);
    }

    #[tokio::test]
    async fn url_ingestion_never_asks_backend_to_wait() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(None).await.unwrap();

        client.add_trs_from_urls(&id, vec!["http://x/2.jpg".into()]).await.unwrap();
        assert_eq!(fake.last_request().unwrap().request_string, "add_trs");

        let waiting = RpcRequest::for_query("add_trs_and_wait", &id);
        let err = client.call(waiting).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(msg) if msg.contains("Unrecognised function")));
    }

    #[tokio::test]
    async fn rejected_reply_carries_backend_message() {
        let client = BackendClient::new(FakeBackend::new());

        let err = client.train("nope", CallMode::Blocking).await.unwrap_err();
        match err {
            BackendError::Rejected(msg) => assert!(msg.contains("unknown query id")),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_ranking_returns_requested_page() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(None).await.unwrap();

        let ranking = client.get_ranking(&id, 1).await.unwrap();
        assert_eq!(ranking.page, 1);
        assert_eq!(ranking.rlist.len(), 3);
        assert_eq!(fake.last_request().unwrap().retrieve_page, 1);
    }

    #[tokio::test]
    async fn persistence_calls_forward_filepath() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(None).await.unwrap();

        client.save_classifier(&id, "/tmp/c.bin").await.unwrap();
        assert_eq!(fake.last_request().unwrap().filepath, "/tmp/c.bin");

        let annos = client.get_annotations("/tmp/a.txt").await.unwrap();
        assert_eq!(annos.len(), 2);
        assert_eq!(fake.last_request().unwrap().filepath, "/tmp/a.txt");
    }

    #[tokio::test]
    async fn tagging_indexing_and_one_shot_ranking() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(None).await.unwrap();

        client.set_tag(&id, "bicycle").await.unwrap();
        assert_eq!(fake.last_request().unwrap().tag, "bicycle");

        client
            .add_dset_images_to_index(vec!["new/1.jpg".into(), "new/2.jpg".into()])
            .await
            .unwrap();
        assert_eq!(fake.last_request().unwrap().paths, vec!["new/1.jpg", "new/2.jpg"]);

        let ranking = client.train_rank_get_ranking(&id).await.unwrap();
        assert_eq!(ranking.rlist.len(), 3);
        assert_eq!(
            fake.request_strings(),
            vec!["start_query", "set_tag", "add_dset_images_to_index", "train_rank_get_ranking"]
        );
    }

    #[tokio::test]
    async fn free_query_forgets_the_id() {
        let fake = FakeBackend::new();
        let client = BackendClient::new(fake.clone());
        let id = client.start_query(None).await.unwrap();

        client.free_query(&id).await.unwrap();
        assert!(client.free_query(&id).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_calls_never_overlap() {
        let fake = FakeBackend::new();
        let client = std::sync::Arc::new(BackendClient::new(fake.clone()));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move { client.start_query(None).await }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }

        assert_eq!(fake.max_in_flight(), 1);
        assert_eq!(fake.request_strings().len(), 16);
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
