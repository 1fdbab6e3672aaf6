// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket seam between the channel manager and the wire.
//!
//! The channel manager only ever talks to a [`Connector`] and the [`Socket`]
//! it hands back, so tests can substitute an in-memory socket. [`WsConnector`]
//! is the tungstenite-backed implementation used by the binary.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lifecycle of a single socket, mirroring the browser `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Inbound events from an open socket, delivered in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Text(String),
    /// Emitted exactly once, after which the event stream ends.
    Closed,
}

/// Handle to one live connection.
pub trait Socket: Send + Sync {
    fn ready_state(&self) -> ReadyState;
    fn send(&self, text: String) -> anyhow::Result<()>;
    fn close(&self) -> anyhow::Result<()>;
}

/// An opened connection: the send/close handle plus its inbound events.
pub struct Connection {
    pub socket: Arc<dyn Socket>,
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Opens connections. Resolves once the socket is open, fails on open errors.
pub trait Connector: Send + Sync {
    fn connect(&self, url: &str) -> BoxFuture<'_, anyhow::Result<Connection>>;
}

/// Connector backed by `tokio_tungstenite::connect_async`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'_, anyhow::Result<Connection>> {
        let url = url.to_owned();
        Box::pin(async move {
            let (stream, _) = tokio_tungstenite::connect_async(&url).await?;
            let (mut write, mut read) = stream.split();

            let state = Arc::new(AtomicU8::new(ReadyState::Open as u8));
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
            let (event_tx, event_rx) = mpsc::unbounded_channel();

            tokio::spawn(async move {
                while let Some(msg) = out_rx.recv().await {
                    let closing = matches!(msg, Message::Close(_));
                    if let Err(e) = write.send(msg).await {
                        debug!(err = %e, "websocket write failed");
                        break;
                    }
                    if closing {
                        break;
                    }
                }
            });

            let reader_state = Arc::clone(&state);
            tokio::spawn(async move {
                while let Some(frame) = read.next().await {
                    match frame {
                        Ok(Message::Text(text)) => {
                            if event_tx.send(SocketEvent::Text(text.to_string())).is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {} // binary/ping/pong ignored
                        Err(e) => {
                            debug!(err = %e, "websocket read failed");
                            break;
                        }
                    }
                }
                reader_state.store(ReadyState::Closed as u8, Ordering::SeqCst);
                let _ = event_tx.send(SocketEvent::Closed);
            });

            let socket: Arc<dyn Socket> = Arc::new(WsSocket { state, out_tx });
            Ok(Connection { socket, events: event_rx })
        })
    }
}

struct WsSocket {
    state: Arc<AtomicU8>,
    out_tx: mpsc::UnboundedSender<Message>,
}

impl Socket for WsSocket {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn send(&self, text: String) -> anyhow::Result<()> {
        if self.ready_state() != ReadyState::Open {
            anyhow::bail!("socket is not open");
        }
        self.out_tx
            .send(Message::Text(text.into()))
            .map_err(|_| anyhow::anyhow!("socket writer has stopped"))
    }

    fn close(&self) -> anyhow::Result<()> {
        let prev = self.state.swap(ReadyState::Closing as u8, Ordering::SeqCst);
        if ReadyState::from_u8(prev) == ReadyState::Closed {
            self.state.store(prev, Ordering::SeqCst);
            return Ok(());
        }
        self.out_tx
            .send(Message::Close(None))
            .map_err(|_| anyhow::anyhow!("socket writer has stopped"))
    }
}
