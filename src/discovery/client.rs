//! Heartbeat client loops run by workers and gateways.

use serde::Serialize;

use super::protocol::{
    ENDPOINT_GATEWAY_HEARTBEAT, ENDPOINT_WORKER_HEARTBEAT, GatewayHeartbeat, WorkerHeartbeat,
};
use crate::config::{HEARTBEAT_INTERVAL, HEARTBEAT_TIMEOUT};

/// Announces a worker to the registry forever. Runs on its own task for the
/// whole process lifetime.
pub async fn worker_heartbeat_loop(registry_address: String, worker_id: String, address: String) {
    let url = format!("http://{}{}", registry_address, ENDPOINT_WORKER_HEARTBEAT);
    let body = WorkerHeartbeat {
        worker_id,
        address,
    };
    heartbeat_loop(url, body).await;
}

/// Announces a gateway to the registry forever.
pub async fn gateway_heartbeat_loop(registry_address: String, gateway_id: String, address: String) {
    let url = format!("http://{}{}", registry_address, ENDPOINT_GATEWAY_HEARTBEAT);
    let body = GatewayHeartbeat {
        gateway_id,
        address,
    };
    heartbeat_loop(url, body).await;
}

async fn heartbeat_loop<T: Serialize>(url: String, body: T) {
    let client = reqwest::Client::new();
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

    loop {
        interval.tick().await;

        let result = client
            .post(&url)
            .json(&body)
            .timeout(HEARTBEAT_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("heartbeat sent to {}", url);
            }
            Ok(resp) => {
                tracing::warn!("heartbeat to {} rejected: {}", url, resp.status());
            }
            Err(e) => {
                tracing::warn!("failed to send heartbeat to {}: {}", url, e);
            }
        }
    }
}
