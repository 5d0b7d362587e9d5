//! backend::messages
//!
//! Protobuf layouts exchanged with the search backend. Requests are
//! distinguished by `request_string`; every reply carries `success` and, on
//! failure, `err_msg`.

use prost::Message;

// -----------------------------------------------------------------------------
// ----- Requests --------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct RpcRequest {
    #[prost(string, tag = "1")]
    pub request_string: String,

    #[prost(string, tag = "2")]
    pub id: String,

    #[prost(string, tag = "3")]
    pub tag: String,

    #[prost(message, optional, tag = "4")]
    pub train_image_urls: Option<TrainImageUrls>,

    #[prost(uint32, tag = "5")]
    pub retrieve_page: u32,

    #[prost(string, tag = "6")]
    pub filepath: String,

    #[prost(string, repeated, tag = "7")]
    pub paths: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TrainImageUrls {
    #[prost(string, repeated, tag = "1")]
    pub urls: Vec<String>,
}

impl RpcRequest {
    pub fn named(request_string: &str) -> Self {
        Self {
            request_string: request_string.to_string(),
            ..Default::default()
        }
    }

    pub fn for_query(request_string: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::named(request_string)
        }
    }

    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.train_image_urls = Some(TrainImageUrls { urls });
        self
    }

    pub fn with_filepath(mut self, filepath: &str) -> Self {
        self.filepath = filepath.to_string();
        self
    }
}

// -----------------------------------------------------------------------------
// ----- Replies ---------------------------------------------------------------

#[derive(Clone, PartialEq, Message)]
pub struct RpcReply {
    #[prost(bool, tag = "1")]
    pub success: bool,

    #[prost(string, tag = "2")]
    pub err_msg: String,

    #[prost(string, tag = "3")]
    pub id: String,

    #[prost(message, optional, tag = "4")]
    pub ranking: Option<RankedList>,

    #[prost(message, repeated, tag = "5")]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, PartialEq, Message)]
pub struct RankedList {
    #[prost(message, repeated, tag = "1")]
    pub rlist: Vec<RankedItem>,

    #[prost(uint32, tag = "2")]
    pub page: u32,

    #[prost(uint32, tag = "3")]
    pub page_count: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct RankedItem {
    #[prost(string, tag = "1")]
    pub path: String,

    #[prost(float, tag = "2")]
    pub score: f32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Annotation {
    #[prost(string, tag = "1")]
    pub path: String,

    #[prost(int32, tag = "2")]
    pub anno: i32,
}

impl RpcReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(err_msg: impl Into<String>) -> Self {
        Self {
            success: false,
            err_msg: err_msg.into(),
            ..Default::default()
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Notifications ---------------------------------------------------------

/// Type URL the backend stamps on notification type tags.
pub const NOTIFICATION_TYPE_URL: &str = "cpuvisor::notification_type";

#[derive(Clone, PartialEq, Message)]
pub struct AnyEnum {
    #[prost(string, tag = "1")]
    pub type_url: String,

    #[prost(int32, tag = "2")]
    pub value: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct VisorNotification {
    #[prost(message, optional, tag = "1")]
    pub notification_type: Option<AnyEnum>,

    #[prost(string, tag = "2")]
    pub id: String,

    #[prost(string, tag = "3")]
    pub data: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum NotificationType {
    StateChange = 0,
    ImageProcessed = 1,
    AllImagesProcessed = 2,
    Error = 3,
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
