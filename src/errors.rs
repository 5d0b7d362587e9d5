use thiserror::Error;

use crate::backend::BackendError;
use crate::gateway::registry::RegistryError;

// -----------------------------------------------------------------------------
// ----- DispatchError ---------------------------------------------------------

/// Everything that can go wrong between receiving a frame and producing a
/// response. Each variant ends up as `err_msg` in a `success: false` reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    // Protocol
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request must be a JSON object")]
    NotAnObject,

    // User
    #[error("request has no 'func' field")]
    MissingFunc,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    // Backend
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DispatchError {
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFunc
                | Self::UnknownCommand(_)
                | Self::MissingField(_)
                | Self::InvalidField { .. }
                | Self::Unsupported(_)
                | Self::Registry(RegistryError::UnknownQueryId(_))
        )
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_names_the_command() {
        let e = DispatchError::UnknownCommand("frobnicate".into());
        assert_eq!(e.to_string(), "Unknown command: frobnicate");
        assert!(e.is_user_error());
    }

    #[test]
    fn backend_rejection_passes_message_through() {
        let e = DispatchError::from(BackendError::Rejected("Request was invalid: boom".into()));
        assert_eq!(e.to_string(), "Request was invalid: boom");
        assert!(!e.is_user_error());
    }

    #[test]
    fn registry_errors_are_transparent() {
        let e = DispatchError::from(RegistryError::UnknownQueryId(999));
        assert_eq!(e.to_string(), "unknown query id: 999");
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
