//! WebSocket notification source.
//!
//! Subscribes with `logsSubscribe` filtered on `mentions: [wallet]` and yields
//! the signature of every transaction that mentions the wallet.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::str::FromStr;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use super::{Notification, NotificationSource};
use crate::config::CommitmentLevel;
use crate::utils::error::{Result, SolTrackError};
use crate::utils::logging;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_REQUEST_ID: u64 = 1;
const UNSUBSCRIBE_REQUEST_ID: u64 = 2;
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Parsed notifications waiting for the monitor. When full, the reader stops
/// pulling frames and the backlog stays in the socket buffer.
const NOTIFICATION_BUFFER: usize = 256;

/// WebSocket notification source.
///
/// Call [`WebSocketSource::connect`] before reading; a failed connection is a
/// startup error. Once connected, a background task parses incoming frames
/// and forwards them through a channel.
pub struct WebSocketSource {
    /// WebSocket URL (ws:// or wss://)
    ws_url: String,
    /// Wallet whose mentions are subscribed to
    wallet: Pubkey,
    commitment: CommitmentLevel,
    state: WebSocketState,
    /// Set when the reader task ended on a transport error.
    failure: Option<SolTrackError>,
}

enum WebSocketState {
    Disconnected,
    Connected {
        subscription_id: u64,
        writer: SplitSink<WsStream, Message>,
        receiver: mpsc::Receiver<Forwarded>,
        reader: JoinHandle<()>,
    },
}

/// What the reader task hands to the source.
enum Forwarded {
    Item(Result<Notification>),
    /// The connection broke; nothing follows.
    Failed(SolTrackError),
}

#[derive(Debug, Deserialize)]
struct LogsNotification {
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: NotificationContext,
    value: NotificationValue,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct NotificationValue {
    signature: String,
}

/// Response to a JSON-RPC request sent over the socket.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

impl WebSocketSource {
    /// Creates a disconnected source.
    ///
    /// # Arguments
    ///
    /// * `ws_url` - WebSocket URL (e.g., "ws://127.0.0.1:8900")
    /// * `wallet` - Account whose mentions are reported
    /// * `commitment` - Commitment level of the subscription
    pub fn new(ws_url: impl Into<String>, wallet: Pubkey, commitment: CommitmentLevel) -> Self {
        Self {
            ws_url: ws_url.into(),
            wallet,
            commitment,
            state: WebSocketState::Disconnected,
            failure: None,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, WebSocketState::Connected { .. })
    }

    fn subscribe_request(&self) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_REQUEST_ID,
            "method": "logsSubscribe",
            "params": [
                { "mentions": [self.wallet.to_string()] },
                { "commitment": self.commitment.as_str() }
            ]
        })
    }

    /// Connects and subscribes.
    ///
    /// # Errors
    ///
    /// Returns [`SolTrackError::WebSocketError`] if the connection cannot be
    /// opened, the node rejects the subscription or does not confirm it in
    /// time.
    pub async fn connect(&mut self) -> Result<()> {
        logging::log(
            logging::LogLevel::Info,
            &format!("Connecting to WebSocket: {}", self.ws_url),
        );

        let (ws_stream, _) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            SolTrackError::WebSocketError(format!("WebSocket connection failed: {e}"))
        })?;

        let (mut writer, mut read) = ws_stream.split();

        writer
            .send(Message::Text(self.subscribe_request().to_string()))
            .await
            .map_err(|e| {
                SolTrackError::WebSocketError(format!("Failed to send subscription: {e}"))
            })?;

        let subscription_id = timeout(SUBSCRIBE_TIMEOUT, await_subscription(&mut read))
            .await
            .map_err(|_| {
                SolTrackError::WebSocketError("Timed out waiting for subscription".to_string())
            })??;

        logging::log(
            logging::LogLevel::Success,
            &format!("WebSocket subscribed (ID: {subscription_id})"),
        );

        let (tx, receiver) = mpsc::channel(NOTIFICATION_BUFFER);
        let reader = tokio::spawn(forward_notifications(read, tx));

        self.state = WebSocketState::Connected {
            subscription_id,
            writer,
            receiver,
            reader,
        };

        Ok(())
    }
}

async fn await_subscription(read: &mut SplitStream<WsStream>) -> Result<u64> {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let Ok(response) = serde_json::from_str::<RpcResponse>(&text) else {
                    continue;
                };
                if response.id != Some(SUBSCRIBE_REQUEST_ID) {
                    continue;
                }
                if let Some(error) = response.error {
                    return Err(SolTrackError::WebSocketError(format!(
                        "logsSubscribe rejected: {}",
                        error.message
                    )));
                }
                return response
                    .result
                    .as_ref()
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        SolTrackError::WebSocketError(
                            "logsSubscribe returned no subscription id".to_string(),
                        )
                    });
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SolTrackError::WebSocketError(format!(
                    "Failed to read subscription response: {e}"
                )));
            }
        }
    }
    Err(SolTrackError::WebSocketError(
        "Connection closed before the subscription was confirmed".to_string(),
    ))
}

/// Reader task: runs until the socket closes, fails, or the receiver is gone.
///
/// A close frame ends the task silently. A read error, or a stream that ends
/// without a close frame, is reported as [`Forwarded::Failed`].
async fn forward_notifications(mut read: SplitStream<WsStream>, tx: mpsc::Sender<Forwarded>) {
    let failure = loop {
        let item = match read.next().await {
            Some(Ok(Message::Text(text))) => parse_message(&text),
            Some(Ok(Message::Close(_))) => return,
            Some(Ok(_)) => None,
            Some(Err(e)) => break format!("WebSocket read failed: {e}"),
            None => break "WebSocket stream ended without a close frame".to_string(),
        };
        if let Some(item) = item {
            if tx.send(Forwarded::Item(item)).await.is_err() {
                return;
            }
        }
    };
    let _ = tx
        .send(Forwarded::Failed(SolTrackError::WebSocketError(failure)))
        .await;
}

/// Parses one text frame. Frames other than `logsNotification` (for example
/// the unsubscribe acknowledgement) yield `None`.
fn parse_message(text: &str) -> Option<Result<Notification>> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(SolTrackError::WebSocketError(format!(
                "Malformed message: {e}"
            ))));
        }
    };

    if value.get("method").and_then(Value::as_str) != Some("logsNotification") {
        return None;
    }

    let notification = match serde_json::from_value::<LogsNotification>(value) {
        Ok(notification) => notification,
        Err(e) => {
            return Some(Err(SolTrackError::WebSocketError(format!(
                "Malformed logsNotification: {e}"
            ))));
        }
    };

    let result = notification.params.result;
    Some(
        Signature::from_str(&result.value.signature)
            .map(|signature| Notification {
                signature,
                slot: result.context.slot,
            })
            .map_err(|e| {
                SolTrackError::WebSocketError(format!(
                    "Invalid signature {}: {e}",
                    result.value.signature
                ))
            }),
    )
}

#[async_trait]
impl NotificationSource for WebSocketSource {
    async fn next_notification(&mut self) -> Option<Result<Notification>> {
        let WebSocketState::Connected { receiver, .. } = &mut self.state else {
            return None;
        };
        match receiver.recv().await? {
            Forwarded::Item(item) => Some(item),
            Forwarded::Failed(e) => {
                self.failure = Some(e);
                None
            }
        }
    }

    fn take_failure(&mut self) -> Option<SolTrackError> {
        self.failure.take()
    }

    async fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, WebSocketState::Disconnected);
        let WebSocketState::Connected {
            subscription_id,
            mut writer,
            reader,
            ..
        } = state
        else {
            return;
        };

        let unsubscribe = json!({
            "jsonrpc": "2.0",
            "id": UNSUBSCRIBE_REQUEST_ID,
            "method": "logsUnsubscribe",
            "params": [subscription_id]
        });
        if let Err(e) = writer.send(Message::Text(unsubscribe.to_string())).await {
            log::debug!("logsUnsubscribe not sent: {e}");
        }
        if let Err(e) = writer.send(Message::Close(None)).await {
            log::debug!("Close frame not sent: {e}");
        }
        reader.abort();

        logging::log(
            logging::LogLevel::Info,
            &format!("WebSocket unsubscribed (ID: {subscription_id})"),
        );
    }

    fn source_name(&self) -> &'static str {
        "WebSocket"
    }
}
