//! WebSocket transport for the game connection, using tokio-tungstenite.
//!
//! Deliberately thin: frames go out through an unbounded queue, inbound
//! frames and the close notification come back on a single ordered event
//! stream. Reconnection is not attempted here; a lost connection is
//! surfaced and the operator decides.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use treasurebot_protocol::{ClientFrame, ServerFrame};

use crate::error::ClientError;

/// What the transport reports upward, in arrival order.
#[derive(Debug)]
pub enum SocketEvent {
    Frame(ServerFrame),
    Closed,
}

/// Handle for the outbound direction; cheap to clone into send closures.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<ClientFrame>,
}

impl FrameSender {
    /// Queue a frame for the writer task. Synchronous on purpose: request
    /// starters run inside the correlation layer's critical section.
    pub fn send(&self, frame: ClientFrame) -> Result<(), ClientError> {
        self.tx.send(frame).map_err(|_| ClientError::NotConnected)
    }
}

type SharedSender = Arc<Mutex<Option<mpsc::UnboundedSender<ClientFrame>>>>;

/// The game socket. One connection at a time; a new `connect` is only legal
/// after the previous connection reported `Closed`.
pub struct GameSocket {
    url: String,
    tx: SharedSender,
    connected: Arc<AtomicBool>,
}

fn store_sender(slot: &SharedSender, value: Option<mpsc::UnboundedSender<ClientFrame>>) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

impl GameSocket {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tx: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn sender(&self) -> Result<FrameSender, ClientError> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| FrameSender { tx: tx.clone() })
            .ok_or(ClientError::NotConnected)
    }

    /// Establish the connection and spawn the reader/writer tasks.
    ///
    /// Returns the ordered inbound event stream. The stream ends with a
    /// single `Closed` event whichever side closes first.
    pub async fn connect(&self) -> Result<mpsc::UnboundedReceiver<SocketEvent>, ClientError> {
        let (ws_stream, _) = connect_async(&self.url).await.map_err(|error| {
            tracing::error!(url = %self.url, %error, "connection handshake failed");
            ClientError::ConnectionFailed
        })?;
        tracing::info!(url = %self.url, "connected to game server");

        let (mut write, mut read) = ws_stream.split();
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ClientFrame>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<SocketEvent>();

        store_sender(&self.tx, Some(frame_tx));
        self.connected.store(true, Ordering::SeqCst);

        let connected = Arc::clone(&self.connected);
        let tx_slot = Arc::clone(&self.tx);
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match ServerFrame::parse(&text) {
                        Ok(frame) => {
                            if event_tx.send(SocketEvent::Frame(frame)).is_err() {
                                break;
                            }
                        }
                        Err(error) => {
                            tracing::warn!(%error, "dropping unparseable frame");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        tracing::error!(%error, "websocket read failed");
                        break;
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            store_sender(&tx_slot, None);
            let _ = event_tx.send(SocketEvent::Closed);
        });

        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(error) => {
                        tracing::error!(%error, "failed to serialize outbound frame");
                        continue;
                    }
                };
                if let Err(error) = write.send(Message::Text(json)).await {
                    tracing::error!(%error, "websocket write failed");
                    break;
                }
            }
            // Channel closed: ask the server to close so the reader winds down.
            let _ = write.send(Message::Close(None)).await;
        });

        Ok(event_rx)
    }

    /// Begin closing: drop the outbound queue, which makes the writer send a
    /// close frame; the reader then reports `Closed`.
    pub fn begin_close(&self) {
        store_sender(&self.tx, None);
    }
}
