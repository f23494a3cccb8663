//! Hub connection: stream subscription over `WebSocket`, submissions over HTTP.

use futures::stream::BoxStream;
use futures::{SinkExt, StreamExt};
use relay_core::{Close, Connect, Message, RelayError, User};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, instrument};

use crate::listener::ListenError;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Client for one hub.
#[derive(Clone, Debug)]
pub struct RelayClient {
    target: String,
    http: reqwest::Client,
}

impl RelayClient {
    /// Client for the hub at `target` (`host:port`).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            http: reqwest::Client::new(),
        }
    }

    /// `host:port` of the hub.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn stream_url(&self) -> String {
        format!("ws://{}/stream", self.target)
    }

    fn broadcast_url(&self) -> String {
        format!("http://{}/broadcast", self.target)
    }

    /// Open a subscription stream as `user`.
    #[instrument(skip_all, fields(target = %self.target, user_id = %user.id))]
    pub async fn connect(&self, user: &User) -> Result<Subscription, RelayError> {
        let dial_failed = |cause: String| RelayError::TransportDialFailed {
            target: self.target.clone(),
            cause,
        };

        let (mut ws, _) = connect_async(self.stream_url())
            .await
            .map_err(|e| dial_failed(e.to_string()))?;

        let connect = Connect::active(user.clone());
        let frame = serde_json::to_string(&connect).map_err(|e| dial_failed(e.to_string()))?;
        ws.send(WsMessage::text(frame))
            .await
            .map_err(|e| dial_failed(e.to_string()))?;

        debug!("subscription open");
        Ok(Subscription { ws })
    }

    /// Submit one message for broadcast. Returns once the hub's round is done.
    #[instrument(skip_all, fields(target = %self.target))]
    pub async fn submit(&self, message: &Message) -> Result<(), RelayError> {
        let submit_failed = |cause: String| RelayError::SubmitFailed { cause };

        let resp = self
            .http
            .post(self.broadcast_url())
            .json(message)
            .send()
            .await
            .map_err(|e| submit_failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| submit_failed(e.to_string()))?;

        let _ack: Close = resp.json().await.map_err(|e| submit_failed(e.to_string()))?;
        Ok(())
    }
}

/// An open subscription stream.
pub struct Subscription {
    ws: WsStream,
}

impl Subscription {
    /// Pushed messages, ending with an error when the stream closes.
    ///
    /// Control frames are skipped. A close frame or transport error yields
    /// one final `Err` and ends the stream.
    pub fn messages(self) -> BoxStream<'static, Result<Message, ListenError>> {
        self.ws
            .filter_map(|frame| async move {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        Some(serde_json::from_str(text.as_str()).map_err(ListenError::Decode))
                    }
                    Ok(WsMessage::Close(_)) => Some(Err(ListenError::Closed)),
                    Ok(_) => None,
                    Err(e) => Some(Err(ListenError::Transport(e.to_string()))),
                }
            })
            .boxed()
    }
}
