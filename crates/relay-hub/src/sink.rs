//! Transport seam: sending to one subscriber.

use async_trait::async_trait;
use relay_core::Message;

use crate::errors::SendError;

/// Write half of one subscriber's stream.
///
/// Implementations are not required to tolerate concurrent writers: the
/// owning [`ConnectionRecord`](crate::ConnectionRecord) serializes calls.
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Push one message to the subscriber.
    async fn send(&mut self, message: &Message) -> Result<(), SendError>;

    /// Close the stream. Called once when the subscription ends.
    async fn close(&mut self) {}
}

#[async_trait]
impl MessageSink for tokio::sync::mpsc::Sender<Message> {
    async fn send(&mut self, message: &Message) -> Result<(), SendError> {
        tokio::sync::mpsc::Sender::send(self, message.clone())
            .await
            .map_err(|_| SendError::Closed)
    }
}
