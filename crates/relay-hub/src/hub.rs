//! Subscribe handling and the fan-out engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, gauge, histogram};
use relay_core::{Connect, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::errors::HubError;
use crate::metrics::{
    BROADCAST_ROUND_SECONDS, BROADCAST_ROUNDS_TOTAL, COMPACTED_RECORDS_TOTAL, DELIVERIES_TOTAL,
    DELIVERY_FAILURES_TOTAL, SUBSCRIPTIONS_ACTIVE, SUBSCRIPTIONS_TOTAL,
};
use crate::record::{ConnectionRecord, Delivery};
use crate::registry::ConnectionRegistry;
use crate::sink::MessageSink;

/// Hub tuning.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Upper bound on one send to one subscriber.
    pub send_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Tally of one fan-out round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Records that were active when the round started.
    pub attempted: usize,
    /// Sends that succeeded.
    pub delivered: usize,
    /// Sends that failed (those records are now inactive).
    pub failed: usize,
    /// Records that went inactive before their send started.
    pub skipped: usize,
}

impl RoundReport {
    fn tally(outcomes: &[Delivery]) -> Self {
        let mut report = Self {
            attempted: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Failed(_) => report.failed += 1,
                Delivery::Skipped => report.skipped += 1,
            }
        }
        report
    }
}

/// The broadcast hub: a connection registry plus the fan-out engine.
pub struct Hub {
    registry: ConnectionRegistry,
    /// Serializes rounds: one message's fan-out completes before the next.
    round_lock: tokio::sync::Mutex<()>,
    config: HubConfig,
}

impl Hub {
    /// Create a hub with an empty registry.
    pub fn new(config: HubConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            round_lock: tokio::sync::Mutex::new(()),
            config,
        }
    }

    /// The connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Hub configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a subscriber and hold until its connection ends.
    ///
    /// Returns `Err(StreamDeliveryFailed)` if a broadcast send to this
    /// subscriber failed, or `Ok(())` once `cancel` fires. Either way the
    /// record is inactive and its sink has been closed when this returns.
    /// A request with `active == false` is not registered.
    #[instrument(skip_all, fields(user_id = %connect.user.id))]
    pub async fn subscribe<S: MessageSink>(
        &self,
        connect: Connect,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<(), HubError> {
        if !connect.active {
            debug!("inactive subscribe request, not registering");
            return Ok(());
        }

        let slot = self.registry.next_slot();
        let (record, signal) = ConnectionRecord::new(connect.user.id, slot, Box::new(sink));
        let record = Arc::new(record);
        self.registry.register(Arc::clone(&record));

        counter!(SUBSCRIPTIONS_TOTAL).increment(1);
        gauge!(SUBSCRIPTIONS_ACTIVE).increment(1.0);
        info!(slot, name = %connect.user.name, "subscription opened");

        let outcome = tokio::select! {
            biased;
            // The sender lives in `record`, so the signal only resolves with a cause.
            Ok(cause) = signal => Err(HubError::StreamDeliveryFailed {
                connection_id: record.id().to_owned(),
                cause,
            }),
            () = cancel.cancelled() => Ok(()),
        };

        let _ = record.deactivate();
        record.release().await;
        gauge!(SUBSCRIPTIONS_ACTIVE).decrement(1.0);

        match &outcome {
            Ok(()) => info!(slot, age_ms = record.age().as_millis(), "subscription closed"),
            Err(e) => warn!(slot, error = %e, "subscription failed"),
        }
        outcome
    }

    /// Deliver `message` to every active subscriber and wait for all sends.
    ///
    /// Never fails: a failed send deactivates that subscriber and wakes its
    /// `subscribe` call with the error, nothing more.
    #[instrument(skip_all, fields(sender_id = %message.sender_id))]
    pub async fn broadcast(&self, message: &Message) -> RoundReport {
        let _round = self.round_lock.lock().await;
        let started = Instant::now();
        let timeout = self.config.send_timeout;

        let targets = self.registry.active();
        let attempts = targets.iter().map(|record| async move {
            let outcome = record.deliver(message, timeout).await;
            match &outcome {
                Delivery::Delivered => counter!(DELIVERIES_TOTAL).increment(1),
                Delivery::Failed(cause) => {
                    counter!(DELIVERY_FAILURES_TOTAL, "reason" => cause.reason()).increment(1);
                    warn!(
                        connection_id = record.id(),
                        slot = record.slot(),
                        error = %cause,
                        "delivery failed, deactivating connection"
                    );
                }
                Delivery::Skipped => {}
            }
            outcome
        });
        let outcomes = join_all(attempts).await;

        let report = RoundReport::tally(&outcomes);
        counter!(BROADCAST_ROUNDS_TOTAL).increment(1);
        histogram!(BROADCAST_ROUND_SECONDS).record(started.elapsed().as_secs_f64());
        debug!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast round complete"
        );
        report
    }

    /// Drop inactive records from the registry.
    pub fn compact(&self) -> usize {
        let removed = self.registry.compact();
        if removed > 0 {
            counter!(COMPACTED_RECORDS_TOTAL).increment(removed as u64);
        }
        removed
    }

    /// Records held by the registry, including inactive ones.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Active records.
    pub fn active_connection_count(&self) -> usize {
        self.registry.active_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

/// Spawn a task that compacts `hub` every `interval` until `cancel` fires.
pub fn spawn_compaction(
    hub: Arc<Hub>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately
        let _ = ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = hub.compact();
                }
                () = cancel.cancelled() => break,
            }
        }
    })
}
