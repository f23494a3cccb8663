//! Listener half: print every message the hub pushes.

use futures::{Stream, StreamExt};
use relay_core::Message;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Why the listener stopped.
#[derive(Debug, Error)]
pub enum ListenError {
    /// The hub closed the stream.
    #[error("stream closed by hub")]
    Closed,
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// A frame was not a valid message.
    #[error("undecodable message: {0}")]
    Decode(#[source] serde_json::Error),
    /// Writing to the output failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Render one message the way the chat shows it.
pub fn format_message(message: &Message) -> String {
    format!("{}: {}", message.sender_id, message.content)
}

/// Print messages from `messages` to `out` until the stream ends.
///
/// Undecodable frames are logged and skipped. Any other error, or the end of
/// the stream, prints `error reading message: ...` and stops the listener.
pub async fn run_listener<S, W>(mut messages: S, mut out: W) -> ListenError
where
    S: Stream<Item = Result<Message, ListenError>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let reason = loop {
        match messages.next().await {
            Some(Ok(message)) => {
                let line = format!("{}\n", format_message(&message));
                if let Err(e) = write_flush(&mut out, &line).await {
                    return ListenError::Output(e);
                }
            }
            Some(Err(ListenError::Decode(e))) => warn!(error = %e, "skipping undecodable message"),
            Some(Err(e)) => break e,
            None => break ListenError::Closed,
        }
    };

    let _ = write_flush(&mut out, &format!("error reading message: {reason}\n")).await;
    reason
}

async fn write_flush<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}
