//! Publisher half: submit each input line as a chat message.

use async_trait::async_trait;
use relay_core::{Message, RelayError, User};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::client::RelayClient;

/// Something that accepts messages for broadcast.
#[async_trait]
pub trait Publish: Send + Sync {
    /// Submit `message`; returns once the hub has finished delivering it.
    async fn publish(&self, message: &Message) -> Result<(), RelayError>;
}

#[async_trait]
impl Publish for RelayClient {
    async fn publish(&self, message: &Message) -> Result<(), RelayError> {
        self.submit(message).await
    }
}

/// Counters from one publisher run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Lines submitted successfully.
    pub sent: usize,
    /// Lines whose submission failed.
    pub failed: usize,
}

/// Read lines from `input` until EOF, submitting each non-empty line.
///
/// Every message carries `user.id` as sender and the session `timestamp`. A
/// failed submission prints `error sending message: ...` to `out` and the
/// next line is still sent, unless the error is fatal, which stops the run.
pub async fn run_publisher<R, P, W>(
    input: R,
    publisher: &P,
    user: &User,
    timestamp: &str,
    mut out: W,
) -> PublishStats
where
    R: AsyncBufRead + Unpin,
    P: Publish + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut stats = PublishStats::default();
    let mut lines = input.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "input read failed, stopping publisher");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let message = Message::new(user.id.as_str(), line, timestamp);
        match publisher.publish(&message).await {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                stats.failed += 1;
                let text = format!("error sending message: {e}\n");
                if out.write_all(text.as_bytes()).await.is_ok() {
                    let _ = out.flush().await;
                }
                if e.is_fatal() {
                    warn!(error = %e, "fatal submit error, stopping publisher");
                    break;
                }
            }
        }
    }

    debug!(sent = stats.sent, failed = stats.failed, "publisher finished");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Mutex;

    struct FakeHub {
        received: Mutex<Vec<Message>>,
        fail_on: Option<usize>,
        fatal: bool,
        calls: AtomicUsize,
    }

    impl FakeHub {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                received: Mutex::default(),
                fail_on,
                fatal: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Publish for FakeHub {
        async fn publish(&self, message: &Message) -> Result<(), RelayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(call) {
                return Err(if self.fatal {
                    RelayError::TransportDialFailed {
                        target: "localhost:1".into(),
                        cause: "gone".into(),
                    }
                } else {
                    RelayError::SubmitFailed {
                        cause: "connection refused".into(),
                    }
                });
            }
            self.received.lock().await.push(message.clone());
            Ok(())
        }
    }

    fn user() -> User {
        User::new("u1", "alice")
    }

    #[tokio::test]
    async fn each_line_becomes_a_message() {
        let hub = FakeHub::new(None);
        let mut out = Vec::new();
        let stats = run_publisher(&b"hello\nworld\n"[..], &hub, &user(), "T0", &mut out).await;

        assert_eq!(stats, PublishStats { sent: 2, failed: 0 });
        let received = hub.received.lock().await;
        assert_eq!(
            *received,
            vec![Message::new("u1", "hello", "T0"), Message::new("u1", "world", "T0")]
        );
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_lines_are_skipped() {
        let hub = FakeHub::new(None);
        let stats = run_publisher(&b"\n  \nhi\n"[..], &hub, &user(), "T0", Vec::new()).await;
        assert_eq!(stats.sent, 1);
    }

    #[tokio::test]
    async fn failure_is_reported_and_publishing_continues() {
        let hub = FakeHub::new(Some(0));
        let mut out = Vec::new();
        let stats = run_publisher(&b"first\nsecond\n"[..], &hub, &user(), "T0", &mut out).await;

        assert_eq!(stats, PublishStats { sent: 1, failed: 1 });
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error sending message: failed to submit message: connection refused\n"
        );
        assert_eq!(hub.received.lock().await[0].content, "second");
    }

    #[tokio::test]
    async fn fatal_error_stops_publishing() {
        let hub = FakeHub {
            fatal: true,
            ..FakeHub::new(Some(0))
        };
        let mut out = Vec::new();
        let stats = run_publisher(&b"first\nsecond\n"[..], &hub, &user(), "T0", &mut out).await;

        assert_eq!(stats, PublishStats { sent: 0, failed: 1 });
        assert!(String::from_utf8(out).unwrap().starts_with("error sending message: "));
        assert!(hub.received.lock().await.is_empty());
    }

    #[tokio::test]
    async fn last_line_without_newline_is_sent() {
        let hub = FakeHub::new(None);
        let stats = run_publisher(&b"tail"[..], &hub, &user(), "T0", Vec::new()).await;
        assert_eq!(stats.sent, 1);
    }
}
