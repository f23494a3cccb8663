//! `WebSocket` subscription adapter.
//!
//! A stream session reads one `Connect` frame, hands the socket's write half
//! to [`Hub::subscribe`] as a [`MessageSink`], and watches the read half for
//! the client going away. Nothing but `Message` frames is ever written back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, close_code};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use relay_core::{Connect, Message};
use relay_hub::{Hub, MessageSink, SendError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a stream was closed before it was registered.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The client went away before sending `Connect`.
    #[error("stream closed before connect")]
    Closed,
    /// No `Connect` frame within the handshake timeout.
    #[error("no connect frame within {0:?}")]
    TimedOut(Duration),
    /// The first data frame was not a valid `Connect`.
    #[error("invalid connect frame: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// Write half of a subscriber's socket.
pub struct WsSink {
    inner: SplitSink<WebSocket, WsMessage>,
}

impl WsSink {
    /// Wrap a socket's write half.
    pub fn new(inner: SplitSink<WebSocket, WsMessage>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(&mut self, message: &Message) -> Result<(), SendError> {
        let text = serde_json::to_string(message).map_err(|e| SendError::Encode(e.to_string()))?;
        self.inner
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|e| SendError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        // Client may already be gone
        let _ = self.inner.send(WsMessage::Close(None)).await;
        let _ = self.inner.close().await;
    }
}

/// Drive one subscription socket to completion.
pub async fn run_stream_session(
    socket: WebSocket,
    hub: Arc<Hub>,
    cancel: CancellationToken,
    handshake_timeout: Duration,
) {
    let (mut tx, mut rx) = socket.split();

    let connect = match read_connect(&mut rx, handshake_timeout).await {
        Ok(connect) => connect,
        Err(e) => {
            warn!(error = %e, "rejecting stream");
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: e.to_string().into(),
            };
            let _ = tx.send(WsMessage::Close(Some(frame))).await;
            return;
        }
    };

    if !connect.active {
        debug!(user_id = %connect.user.id, "inactive connect, closing stream");
        let _ = tx.send(WsMessage::Close(None)).await;
        return;
    }

    let reader = tokio::spawn(watch_client(rx, cancel.clone()));
    let result = hub.subscribe(connect, WsSink::new(tx), cancel).await;
    reader.abort();

    match result {
        Ok(()) => debug!("stream session ended"),
        Err(e) => info!(error = %e, "stream torn down after failed delivery"),
    }
}

/// Read frames until the first data frame and decode it as `Connect`.
async fn read_connect(
    rx: &mut SplitStream<WebSocket>,
    timeout: Duration,
) -> Result<Connect, HandshakeError> {
    let first = async {
        while let Some(frame) = rx.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    return serde_json::from_str::<Connect>(text.as_str())
                        .map_err(HandshakeError::Invalid);
                }
                Ok(WsMessage::Binary(bytes)) => {
                    return serde_json::from_slice::<Connect>(&bytes).map_err(HandshakeError::Invalid);
                }
                Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {}
                Ok(WsMessage::Close(_)) | Err(_) => break,
            }
        }
        Err(HandshakeError::Closed)
    };
    tokio::time::timeout(timeout, first)
        .await
        .map_err(|_| HandshakeError::TimedOut(timeout))?
}

/// Cancel the subscription once the client closes or the socket errors.
///
/// Data frames after `Connect` are ignored.
async fn watch_client(mut rx: SplitStream<WebSocket>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            frame = rx.next() => match frame {
                Some(Ok(WsMessage::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            () = cancel.cancelled() => return,
        }
    }
    debug!("client went away");
    cancel.cancel();
}
