//! Per-subscriber connection state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use relay_core::Message;
use tokio::sync::oneshot;

use crate::errors::SendError;
use crate::sink::MessageSink;

/// Outcome of one delivery attempt to one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the message.
    Delivered,
    /// The record went inactive before the send started.
    Skipped,
    /// The sink failed; the record is now inactive.
    Failed(SendError),
}

/// The hub's bookkeeping entry for one subscriber.
///
/// `active` only ever goes from `true` to `false`. The error signal is a
/// one-shot slot: written at most once, never blocking the writer.
pub struct ConnectionRecord {
    /// Subscriber ID (the subscribing user's ID).
    id: String,
    /// Registry slot, unique for the hub's lifetime.
    slot: u64,
    active: AtomicBool,
    /// Send lock: at most one in-flight send per connection. `None` once
    /// the subscription has ended and the transport was released.
    sink: tokio::sync::Mutex<Option<Box<dyn MessageSink>>>,
    error_signal: Mutex<Option<oneshot::Sender<SendError>>>,
    connected_at: Instant,
}

impl ConnectionRecord {
    /// Create an active record and the receiving end of its error signal.
    pub fn new(
        id: impl Into<String>,
        slot: u64,
        sink: Box<dyn MessageSink>,
    ) -> (Self, oneshot::Receiver<SendError>) {
        let (tx, rx) = oneshot::channel();
        let record = Self {
            id: id.into(),
            slot,
            active: AtomicBool::new(true),
            sink: tokio::sync::Mutex::new(Some(sink)),
            error_signal: Mutex::new(Some(tx)),
            connected_at: Instant::now(),
        };
        (record, rx)
    }

    /// Subscriber ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registry slot.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Whether broadcasts should still target this record.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Time since the record was created.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Mark the record inactive without signalling an error.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    /// Mark the record inactive and write `cause` to the error signal.
    ///
    /// The signal is written only if it has not been written before. A
    /// receiver that already went away is not an error.
    pub(crate) fn fail(&self, cause: SendError) {
        let _ = self.deactivate();
        if let Some(tx) = self.error_signal.lock().take() {
            let _ = tx.send(cause);
        }
    }

    /// Send `message` under the record's send lock.
    ///
    /// Active state is re-checked after the lock is taken so that a record
    /// that failed or was cancelled while this call waited is skipped.
    pub(crate) async fn deliver(&self, message: &Message, timeout: Duration) -> Delivery {
        let mut guard = self.sink.lock().await;
        if !self.is_active() {
            return Delivery::Skipped;
        }
        let Some(sink) = guard.as_mut() else {
            return Delivery::Skipped;
        };

        let result = match tokio::time::timeout(timeout, sink.send(message)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::TimedOut(timeout)),
        };

        match result {
            Ok(()) => Delivery::Delivered,
            Err(cause) => {
                self.fail(cause.clone());
                Delivery::Failed(cause)
            }
        }
    }

    /// Close and drop the transport sink. Idempotent.
    ///
    /// Waits for an in-flight send to finish first.
    pub(crate) async fn release(&self) {
        let sink = self.sink.lock().await.take();
        if let Some(mut sink) = sink {
            sink.close().await;
        }
    }
}

impl std::fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn make_record(id: &str) -> (ConnectionRecord, oneshot::Receiver<SendError>, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(8);
        let (record, signal) = ConnectionRecord::new(id, 0, Box::new(tx));
        (record, signal, rx)
    }

    fn msg(content: &str) -> Message {
        Message::new("sender", content, "T1")
    }

    struct StallingSink;

    #[async_trait]
    impl MessageSink for StallingSink {
        async fn send(&mut self, _message: &Message) -> Result<(), SendError> {
            std::future::pending().await
        }
    }

    #[test]
    fn new_record_is_active() {
        let (record, _signal, _rx) = make_record("u1");
        assert_eq!(record.id(), "u1");
        assert_eq!(record.slot(), 0);
        assert!(record.is_active());
    }

    #[tokio::test]
    async fn deliver_success() {
        let (record, _signal, mut rx) = make_record("u1");
        assert_eq!(record.deliver(&msg("hi"), TIMEOUT).await, Delivery::Delivered);
        assert_eq!(rx.recv().await.unwrap().content, "hi");
        assert!(record.is_active());
    }

    #[tokio::test]
    async fn deliver_failure_deactivates_and_signals() {
        let (record, signal, rx) = make_record("u1");
        drop(rx);
        let outcome = record.deliver(&msg("hi"), TIMEOUT).await;
        assert_eq!(outcome, Delivery::Failed(SendError::Closed));
        assert!(!record.is_active());
        assert_eq!(signal.await.unwrap(), SendError::Closed);
    }

    #[tokio::test]
    async fn deliver_to_inactive_is_skipped() {
        let (record, _signal, mut rx) = make_record("u1");
        assert!(record.deactivate());
        assert_eq!(record.deliver(&msg("hi"), TIMEOUT).await, Delivery::Skipped);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_send_times_out() {
        let (record, signal) = ConnectionRecord::new("slow", 3, Box::new(StallingSink));
        let timeout = Duration::from_millis(200);
        let outcome = record.deliver(&msg("hi"), timeout).await;
        assert_eq!(outcome, Delivery::Failed(SendError::TimedOut(timeout)));
        assert!(!record.is_active());
        assert_eq!(signal.await.unwrap(), SendError::TimedOut(timeout));
    }

    #[test]
    fn deactivate_is_one_way() {
        let (record, _signal, _rx) = make_record("u1");
        assert!(record.deactivate());
        assert!(!record.deactivate());
        assert!(!record.is_active());
    }

    #[test]
    fn fail_writes_signal_at_most_once() {
        let (record, mut signal, _rx) = make_record("u1");
        record.fail(SendError::Closed);
        record.fail(SendError::Transport("second".into()));
        assert_eq!(signal.try_recv().unwrap(), SendError::Closed);
    }

    #[test]
    fn fail_without_receiver_does_not_block() {
        let (record, signal, _rx) = make_record("u1");
        drop(signal);
        record.fail(SendError::Closed);
        assert!(!record.is_active());
    }

    #[tokio::test]
    async fn release_drops_sink() {
        let (record, _signal, mut rx) = make_record("u1");
        record.release().await;
        // Sender dropped: the receiving side sees end of stream.
        assert!(rx.recv().await.is_none());
        assert_eq!(record.deliver(&msg("late"), TIMEOUT).await, Delivery::Skipped);
        record.release().await;
    }

    #[test]
    fn debug_omits_transport() {
        let (record, _signal, _rx) = make_record("u1");
        let debug = format!("{record:?}");
        assert!(debug.contains("u1"));
        assert!(debug.contains("active: true"));
    }
}
