use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendClient, BackendError, RpcTransport};

// -----------------------------------------------------------------------------
// ----- QueryRegistry ---------------------------------------------------------

/// Numeric query ids handed to legacy clients, mapped onto backend query ids.
///
/// Numeric ids start at 1 and are never reused within a process.
#[derive(Debug)]
pub struct QueryRegistry {
    inner: Mutex<RegistryMap>,
}

#[derive(Debug)]
struct RegistryMap {
    next_id: u64,
    by_numeric: HashMap<u64, String>,
}

// -----------------------------------------------------------------------------
// ----- QueryRegistry: Static -------------------------------------------------

impl QueryRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryMap {
                next_id: 1,
                by_numeric: HashMap::new(),
            }),
        }
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// ----- QueryRegistry: Public -------------------------------------------------

impl QueryRegistry {
    /// Starts a backend query and returns the numeric id assigned to it.
    pub async fn allocate<T: RpcTransport>(
        &self,
        backend: &BackendClient<T>,
    ) -> Result<u64, RegistryError> {
        let backend_id = backend.start_query(None).await?;

        let numeric_id = {
            let mut guard = self.inner.lock();
            let id = guard.next_id;
            guard.next_id += 1;
            guard.by_numeric.insert(id, backend_id.clone());
            id
        };

        info!("query {numeric_id} -> backend query {backend_id}");

        Ok(numeric_id)
    }

    pub fn resolve(&self, numeric_id: u64) -> Result<String, RegistryError> {
        self.inner
            .lock()
            .by_numeric
            .get(&numeric_id)
            .cloned()
            .ok_or(RegistryError::UnknownQueryId(numeric_id))
    }

    /// Forgets the mapping, then frees the backend query. The numeric id is
    /// gone even if the backend rejects the free.
    pub async fn release<T: RpcTransport>(
        &self,
        numeric_id: u64,
        backend: &BackendClient<T>,
    ) -> Result<(), RegistryError> {
        let backend_id = self
            .inner
            .lock()
            .by_numeric
            .remove(&numeric_id)
            .ok_or(RegistryError::UnknownQueryId(numeric_id))?;

        info!("releasing query {numeric_id} (backend query {backend_id})");

        backend.free_query(&backend_id).await?;

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// ----- Errors ----------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown query id: {0}")]
    UnknownQueryId(u64),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
