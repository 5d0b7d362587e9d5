use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

// -----------------------------------------------------------------------------
// ----- Settings --------------------------------------------------------------

/// Contents of the settings file: where the backend lives and where its
/// dataset images are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_endpoint: String,
    pub notify_endpoint: Option<String>,
    pub dataset_im_base_path: PathBuf,
}

// -----------------------------------------------------------------------------
// ----- Settings: Static ------------------------------------------------------

impl Settings {
    pub async fn from_file_async(path: &Path) -> Result<Settings, SettingsError> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| SettingsError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Settings, SettingsError> {
        let doc: SettingsFile = toml::from_str(raw).map_err(|e| SettingsError::Toml { source: e })?;

        validate_endpoint("backend.server_endpoint", &doc.backend.server_endpoint)?;
        if let Some(notify) = doc.backend.notify_endpoint.as_deref() {
            validate_endpoint("backend.notify_endpoint", notify)?;
        }

        Ok(Settings {
            server_endpoint: doc.backend.server_endpoint,
            notify_endpoint: doc.backend.notify_endpoint,
            dataset_im_base_path: doc.dataset.im_base_path,
        })
    }
}

// -----------------------------------------------------------------------------
// ----- Internal: On-disk format ----------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    backend: BackendSection,

    #[serde(default)]
    dataset: DatasetSection,
}

#[derive(Debug, Clone, Deserialize)]
struct BackendSection {
    server_endpoint: String,

    #[serde(default)]
    notify_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatasetSection {
    #[serde(default)]
    im_base_path: PathBuf,
}

// -----------------------------------------------------------------------------
// ----- Internal: Helpers -----------------------------------------------------

fn validate_endpoint(field: &str, endpoint: &str) -> Result<(), SettingsError> {
    let Some(rest) = endpoint.strip_prefix("tcp://") else {
        return Err(SettingsError::InvalidField(format!(
            "{field} must be a tcp:// endpoint, got '{endpoint}'"
        )));
    };

    if rest.trim().is_empty() {
        return Err(SettingsError::InvalidField(format!("{field} has no address")));
    }

    Ok(())
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("read error for {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("toml parse error: {source}")]
    Toml { source: toml::de::Error },
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
