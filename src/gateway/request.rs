//! Validated legacy requests.
//!
//! The raw JSON object is looked up by its `func` name in a static command
//! table, then its fields are checked and turned into one `Request` variant.

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::backend::CallMode;
use crate::errors::DispatchError;

// -----------------------------------------------------------------------------
// ----- Command table ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SelfTest,
    GetQueryId,
    ReleaseQueryId,
    AddPosTrs,
    AddPosTrsAsync,
    AddNegTrs,
    SaveAnnotations,
    GetAnnotations,
    LoadAnnotationsAndTrs,
    SaveClassifier,
    LoadClassifier,
    Train,
    Rank,
    GetRanking,
}

static COMMAND_TABLE: Lazy<HashMap<&'static str, CommandKind>> = Lazy::new(|| {
    HashMap::from([
        ("selfTest", CommandKind::SelfTest),
        ("getQueryId", CommandKind::GetQueryId),
        ("releaseQueryId", CommandKind::ReleaseQueryId),
        ("addPosTrs", CommandKind::AddPosTrs),
        ("addPosTrsAndWait", CommandKind::AddPosTrs),
        ("addPosTrsAsync", CommandKind::AddPosTrsAsync),
        ("addNegTrs", CommandKind::AddNegTrs),
        ("saveAnnotations", CommandKind::SaveAnnotations),
        ("getAnnotations", CommandKind::GetAnnotations),
        ("loadAnnotationsAndTrs", CommandKind::LoadAnnotationsAndTrs),
        ("saveClassifier", CommandKind::SaveClassifier),
        ("loadClassifier", CommandKind::LoadClassifier),
        ("train", CommandKind::Train),
        ("rank", CommandKind::Rank),
        ("getRanking", CommandKind::GetRanking),
        ("getRankingSubset", CommandKind::GetRanking),
    ])
});

impl CommandKind {
    pub fn lookup(func: &str) -> Option<Self> {
        COMMAND_TABLE.get(func).copied()
    }
}

// -----------------------------------------------------------------------------
// ----- Request ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    SelfTest,
    GetQueryId,
    ReleaseQueryId { query_id: u64 },
    AddPosTrs { query_id: u64, impath: String, mode: CallMode },
    AddNegTrs,
    SaveAnnotations { query_id: u64, filepath: String },
    GetAnnotations { filepath: String },
    LoadAnnotationsAndTrs,
    SaveClassifier { query_id: u64, filepath: String },
    LoadClassifier { query_id: u64, filepath: String },
    Train { query_id: u64 },
    Rank { query_id: u64 },
    GetRanking { query_id: u64 },
}

// -----------------------------------------------------------------------------
// ----- Request: Static -------------------------------------------------------

impl Request {
    pub fn from_slice(payload: &[u8]) -> Result<Self, DispatchError> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        let Value::Object(fields) = value else {
            return Err(DispatchError::NotAnObject);
        };

        let func = match fields.get("func") {
            Some(Value::String(func)) => func.as_str(),
            _ => return Err(DispatchError::MissingFunc),
        };

        let kind = CommandKind::lookup(func)
            .ok_or_else(|| DispatchError::UnknownCommand(func.to_string()))?;

        Self::from_fields(kind, &fields)
    }

    fn from_fields(kind: CommandKind, f: &Map<String, Value>) -> Result<Self, DispatchError> {
        let request = match kind {
            CommandKind::SelfTest => Request::SelfTest,
            CommandKind::GetQueryId => Request::GetQueryId,
            CommandKind::ReleaseQueryId => Request::ReleaseQueryId {
                query_id: query_id(f)?,
            },
            CommandKind::AddPosTrs => Request::AddPosTrs {
                query_id: query_id(f)?,
                impath: string_field(f, "impath")?,
                mode: CallMode::Blocking,
            },
            CommandKind::AddPosTrsAsync => Request::AddPosTrs {
                query_id: query_id(f)?,
                impath: string_field(f, "impath")?,
                mode: CallMode::NonBlocking,
            },
            CommandKind::AddNegTrs => Request::AddNegTrs,
            CommandKind::SaveAnnotations => Request::SaveAnnotations {
                query_id: query_id(f)?,
                filepath: string_field(f, "filepath")?,
            },
            CommandKind::GetAnnotations => Request::GetAnnotations {
                filepath: string_field(f, "filepath")?,
            },
            CommandKind::LoadAnnotationsAndTrs => Request::LoadAnnotationsAndTrs,
            CommandKind::SaveClassifier => Request::SaveClassifier {
                query_id: query_id(f)?,
                filepath: string_field(f, "filepath")?,
            },
            CommandKind::LoadClassifier => Request::LoadClassifier {
                query_id: query_id(f)?,
                filepath: string_field(f, "filepath")?,
            },
            CommandKind::Train => Request::Train {
                query_id: query_id(f)?,
            },
            CommandKind::Rank => Request::Rank {
                query_id: query_id(f)?,
            },
            CommandKind::GetRanking => Request::GetRanking {
                query_id: query_id(f)?,
            },
        };

        Ok(request)
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

fn query_id(f: &Map<String, Value>) -> Result<u64, DispatchError> {
    const EXPECTED: &str = "a non-negative integer";

    match f.get("query_id") {
        None | Some(Value::Null) => Err(DispatchError::MissingField("query_id")),
        Some(Value::Number(n)) => n.as_u64().ok_or(DispatchError::InvalidField {
            field: "query_id",
            expected: EXPECTED,
        }),
        // some legacy clients send ids as strings
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().map_err(|_| DispatchError::InvalidField {
                field: "query_id",
                expected: EXPECTED,
            })
        }
        Some(_) => Err(DispatchError::InvalidField {
            field: "query_id",
            expected: EXPECTED,
        }),
    }
}

fn string_field(f: &Map<String, Value>, name: &'static str) -> Result<String, DispatchError> {
    match f.get(name) {
        None | Some(Value::Null) => Err(DispatchError::MissingField(name)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DispatchError::InvalidField {
            field: name,
            expected: "a string",
        }),
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
