use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("undecodable notification: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("notification carries no type")]
    MissingType,

    #[error("unexpected notification type url '{0}'")]
    UnexpectedTypeUrl(String),

    #[error("unknown notification kind {0}")]
    UnknownKind(i32),
}

impl NotifyError {
    /// Per-message problems; the stream itself is still usable.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, NotifyError::Transport(_))
    }
}
