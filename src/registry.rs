//! One memoized connection per backend.

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::backend::{BackendAdapter, Connector};
use crate::core::{Backend, BenchError};

pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    handles: Mutex<HashMap<Backend, Arc<dyn BackendAdapter>>>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached handle, opening it on first use.
    ///
    /// The lock is held while opening so concurrent callers never race two
    /// connections to the same backend.
    pub async fn connect(&self, backend: Backend) -> Result<Arc<dyn BackendAdapter>, BenchError> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(&backend) {
            return Ok(handle.clone());
        }

        let handle = self.connector.open(backend).await?;
        info!("{} connection established", backend);
        handles.insert(backend, handle.clone());
        Ok(handle)
    }

    /// Cached handle, or `None` if `connect` has not succeeded yet.
    pub async fn get_handle(&self, backend: Backend) -> Option<Arc<dyn BackendAdapter>> {
        self.handles.lock().await.get(&backend).cloned()
    }

    pub async fn connected(&self) -> Vec<Backend> {
        let handles = self.handles.lock().await;
        Backend::ALL
            .into_iter()
            .filter(|b| handles.contains_key(b))
            .collect()
    }

    /// Closes every handle and empties the registry.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.handles.lock().await.drain().collect();
        for (backend, handle) in drained {
            match handle.close().await {
                Ok(()) => info!("{} connection closed", backend),
                Err(e) => warn!("closing {} connection failed: {}", backend, e),
            }
        }
    }
}
