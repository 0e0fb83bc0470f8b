//! Pool of reusable RPC client handles, keyed by worker address.

use std::collections::HashMap;

use anyhow::Result;
use std::time::Duration;
use tokio::sync::RwLock;

/// Plaintext HTTP handles to workers. A handle is created on first use and
/// reused until its worker is evicted; a worker resurfacing under the same
/// address gets a fresh handle.
pub struct RpcPool {
    clients: RwLock<HashMap<String, reqwest::Client>>,
}

impl RpcPool {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached handle for `address`, creating one on first use.
    /// Double-checked under the lock so concurrent first calls build a
    /// single handle. Creation failures are not cached.
    pub async fn get(&self, address: &str) -> Result<reqwest::Client> {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(address) {
                return Ok(client.clone());
            }
        }

        let mut clients = self.clients.write().await;
        // double check
        if let Some(client) = clients.get(address) {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(1))
            .build()
            .map_err(|e| {
                tracing::warn!("failed to create client for {}: {}", address, e);
                anyhow::anyhow!(e)
            })?;
        clients.insert(address.to_string(), client.clone());
        Ok(client)
    }

    /// Drops the handle for an evicted worker; in-flight requests finish,
    /// idle connections close when the last clone is gone.
    pub async fn remove(&self, address: &str) {
        self.clients.write().await.remove(address);
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}
