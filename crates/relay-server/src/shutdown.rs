//! Server-wide cancellation.
//!
//! One root [`CancellationToken`] per server. The HTTP listener, the
//! compaction task, and every live subscription hold tokens derived from it,
//! so a single [`ShutdownCoordinator::shutdown`] ends all of them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Bound on the drain after cancellation.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the root cancellation token.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    root: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator with a fresh root token.
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// A clone of the root token.
    pub fn token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// A token for one subscription: cancelled by a server shutdown, or on
    /// its own when that subscriber's transport goes away.
    pub fn subscription_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Cancel everything.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel, then wait up to `timeout` for `tasks` to finish.
    ///
    /// Tasks still running after the timeout are left to the runtime.
    pub async fn drain(&self, tasks: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);
        self.shutdown();
        info!(tasks = tasks.len(), timeout_ms = timeout.as_millis(), "draining");

        if tokio::time::timeout(timeout, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            warn!(?timeout, "drain timed out, exiting with tasks still running");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
