use thiserror::Error;

// -----------------------------------------------------------------------------
// ----- BackendError ----------------------------------------------------------

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with `success = false`; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("backend transport error: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("backend sent an empty reply")]
    EmptyReply,

    #[error("could not decode backend reply: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("backend reply is missing '{0}'")]
    MissingField(&'static str),
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
