use prost::Message;

use super::error::NotifyError;
use crate::backend::messages::{NOTIFICATION_TYPE_URL, NotificationType, VisorNotification};

// -----------------------------------------------------------------------------
// ----- Notification ----------------------------------------------------------

/// A decoded backend notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationType,
    pub query_id: Option<String>,
    pub data: String,
}

// -----------------------------------------------------------------------------
// ----- Notification: Static --------------------------------------------------

impl Notification {
    pub fn decode(raw: &[u8]) -> Result<Self, NotifyError> {
        let msg = VisorNotification::decode(raw)?;

        let tagged = msg.notification_type.ok_or(NotifyError::MissingType)?;
        if tagged.type_url != NOTIFICATION_TYPE_URL {
            return Err(NotifyError::UnexpectedTypeUrl(tagged.type_url));
        }

        let kind = NotificationType::try_from(tagged.value)
            .map_err(|_| NotifyError::UnknownKind(tagged.value))?;

        let query_id = (!msg.id.is_empty()).then_some(msg.id);

        Ok(Self {
            kind,
            query_id,
            data: msg.data,
        })
    }
}

// -----------------------------------------------------------------------------
// ----- Notification: Public --------------------------------------------------

impl Notification {
    pub fn label(&self) -> &'static str {
        match self.kind {
            NotificationType::StateChange => "state-change",
            NotificationType::ImageProcessed => "image-processed",
            NotificationType::AllImagesProcessed => "all-images-processed",
            NotificationType::Error => "error",
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
pub(crate) fn encode_for_test(kind: i32, type_url: &str, id: &str, data: &str) -> Vec<u8> {
    use crate::backend::messages::AnyEnum;

    VisorNotification {
        notification_type: Some(AnyEnum {
            type_url: type_url.to_string(),
            value: kind,
        }),
        id: id.to_string(),
        data: data.to_string(),
    }
    .encode_to_vec()
}


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
