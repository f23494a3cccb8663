//! `/health` endpoint.

use std::time::Instant;

use relay_hub::Hub;
use serde::Serialize;

/// Server lifecycle as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Accepting subscriptions and broadcasts.
    Ok,
    /// Shutdown has begun; subscriptions are being closed.
    Draining,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Lifecycle state.
    pub status: HealthStatus,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Connection records held by the registry, including inactive ones.
    pub connections: usize,
    /// Records still targeted by broadcasts.
    pub active_connections: usize,
}

/// Snapshot `hub` for a health response.
pub fn health_check(start_time: Instant, hub: &Hub, shutting_down: bool) -> HealthResponse {
    HealthResponse {
        status: if shutting_down {
            HealthStatus::Draining
        } else {
            HealthStatus::Ok
        },
        uptime_secs: start_time.elapsed().as_secs(),
        connections: hub.connection_count(),
        active_connections: hub.active_connection_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use relay_core::{Connect, Message, User};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn fresh_hub_is_ok_and_empty() {
        let resp = health_check(Instant::now(), &Hub::default(), false);
        assert_eq!(resp.status, HealthStatus::Ok);
        assert_eq!(resp.connections, 0);
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_counts_from_start() {
        let start = Instant::now().checked_sub(Duration::from_secs(60)).unwrap();
        assert!(health_check(start, &Hub::default(), false).uptime_secs >= 59);
    }

    #[test]
    fn shutting_down_reports_draining() {
        let resp = health_check(Instant::now(), &Hub::default(), true);
        let parsed = serde_json::to_value(&resp).unwrap();
        assert_eq!(parsed["status"], "draining");
    }

    #[tokio::test]
    async fn counts_follow_hub_registry() {
        let hub = Arc::new(Hub::default());
        let (tx, _rx) = mpsc::channel::<Message>(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let hub = Arc::clone(&hub);
            let cancel = cancel.clone();
            async move { hub.subscribe(Connect::active(User::new("A", "A")), tx, cancel).await }
        });
        while hub.connection_count() == 0 {
            tokio::task::yield_now().await;
        }

        let parsed = serde_json::to_value(health_check(Instant::now(), &hub, false)).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["connections"], 1);
        assert_eq!(parsed["active_connections"], 1);

        cancel.cancel();
        task.await.unwrap().unwrap();
        let resp = health_check(Instant::now(), &hub, false);
        assert_eq!((resp.connections, resp.active_connections), (1, 0));
    }
}
