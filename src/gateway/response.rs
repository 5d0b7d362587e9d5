use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::wire_protocol::frame_codec;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const UNSERIALIZABLE: &[u8] = br#"{"success":false,"err_msg":"could not serialize response"}"#;

// -----------------------------------------------------------------------------
// ----- Response --------------------------------------------------------------

/// Reply sent to a legacy client: `success`, `err_msg` on failure, plus any
/// command-specific fields at the top level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// -----------------------------------------------------------------------------
// ----- Response: Static ------------------------------------------------------

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            err_msg: None,
            fields: Map::new(),
        }
    }

    pub fn failure(err_msg: impl Into<String>) -> Self {
        Self {
            success: false,
            err_msg: Some(err_msg.into()),
            fields: Map::new(),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Response: Builder -----------------------------------------------------

impl Response {
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

// -----------------------------------------------------------------------------
// ----- Response: Public ------------------------------------------------------

impl Response {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| UNSERIALIZABLE.to_vec())
    }

    /// JSON payload plus frame terminator, ready for the socket.
    pub fn to_bytes(&self) -> Bytes {
        frame_codec::encode(&self.to_json())
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_serializes_bare_success() {
        assert_eq!(Response::ok().to_json(), br#"{"success":true}"#.to_vec());
    }

    #[test]
    fn failure_carries_err_msg() {
        let json = Response::failure("nope").to_json();
        assert_eq!(json, br#"{"success":false,"err_msg":"nope"}"#.to_vec());
    }

    #[test]
    fn fields_are_flattened() {
        let r = Response::ok().with("query_id", 3);
        assert_eq!(r.to_json(), br#"{"success":true,"query_id":3}"#.to_vec());
    }

    #[test]
    fn to_bytes_is_framed() {
        let b = Response::ok().to_bytes();
        assert!(b.ends_with(frame_codec::TERMINATOR));
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
