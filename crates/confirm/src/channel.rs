// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle of one confirmation channel: open, authenticate, receive,
//! send, and close.
//!
//! Two instances exist (PIN and notification) and share this logic. A
//! channel owns its socket exclusively; flows only ever go through
//! [`Channel::send`] and [`Channel::close`].

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::ChannelError;
use crate::event::{emit, ConfirmEvent, EventSender};
use crate::loader::LoadingTracker;
use crate::protocol::{encode, AuthEnvelope};
use crate::transport::{BoxFuture, Connector, ReadyState, Socket, SocketEvent};

pub const PIN_PATH: &str = "/api/v1/pin";
pub const NOTIFICATION_PATH: &str = "/api/v1/notification";

/// Which confirmation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Pin,
    Notification,
}

impl ChannelKind {
    pub const ALL: [Self; 2] = [Self::Pin, Self::Notification];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Pin => PIN_PATH,
            Self::Notification => NOTIFICATION_PATH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pin" => Ok(Self::Pin),
            "notification" => Ok(Self::Notification),
            other => Err(format!("unknown channel: {other}")),
        }
    }
}

/// Receives every decoded inbound frame, in arrival order.
pub trait FrameHandler: Send + Sync {
    fn handle(&self, payload: Value) -> BoxFuture<'_, anyhow::Result<()>>;

    /// Called once after the connection that fed this handler has closed.
    fn on_close(&self, _channel: ChannelKind) {}
}

/// Supplies the opaque token sent in the auth envelope.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> String;
}

/// A token fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> String {
        self.0.clone()
    }
}

struct Link {
    socket: Arc<dyn Socket>,
    generation: u64,
}

pub struct Channel {
    kind: ChannelKind,
    url: String,
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenProvider>,
    loader: Arc<dyn LoadingTracker>,
    events: EventSender,
    link: Mutex<Option<Link>>,
    generation: AtomicU64,
    loading_timer: Mutex<Option<JoinHandle<()>>>,
    waiting_for_pin: AtomicBool,
}

impl Channel {
    pub fn new(
        kind: ChannelKind,
        base_url: &str,
        connector: Arc<dyn Connector>,
        tokens: Arc<dyn TokenProvider>,
        loader: Arc<dyn LoadingTracker>,
        events: EventSender,
    ) -> Arc<Self> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), kind.path());
        Arc::new(Self {
            kind,
            url,
            connector,
            tokens,
            loader,
            events,
            link: Mutex::new(None),
            generation: AtomicU64::new(0),
            loading_timer: Mutex::new(None),
            waiting_for_pin: AtomicBool::new(false),
        })
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the connection and send the auth envelope.
    ///
    /// Open errors are logged with their cause; the caller only ever sees
    /// [`ChannelError::TransportOpen`]. Inbound frames go to `handler`.
    pub async fn connect(self: &Arc<Self>, handler: Arc<dyn FrameHandler>) -> Result<(), ChannelError> {
        let connection = match self.connector.connect(&self.url).await {
            Ok(c) => c,
            Err(e) => {
                error!(channel = %self.kind, url = %self.url, err = %e, "websocket error");
                emit(
                    &self.events,
                    ConfirmEvent::OpenFailed { channel: self.kind, reason: e.to_string() },
                );
                return Err(ChannelError::TransportOpen);
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let socket = Arc::clone(&connection.socket);
        {
            let mut link = self.link.lock();
            if link.is_some() {
                warn!(channel = %self.kind, "replacing a live connection; close before reconnecting");
            }
            *link = Some(Link { socket: Arc::clone(&socket), generation });
        }
        info!(channel = %self.kind, url = %self.url, "websocket connection opened");
        emit(&self.events, ConfirmEvent::Opened { channel: self.kind });

        // Auth goes out before connect resolves, so before any caller send.
        match encode(&AuthEnvelope { id: self.tokens.token() }) {
            Ok(frame) => {
                if let Err(e) = socket.send(frame) {
                    error!(channel = %self.kind, err = %e, "failed to send auth envelope");
                }
            }
            Err(e) => error!(channel = %self.kind, err = %e, "failed to encode auth envelope"),
        }

        let channel = Arc::clone(self);
        let mut events = connection.events;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    SocketEvent::Text(text) => channel.dispatch(handler.as_ref(), &text).await,
                    SocketEvent::Closed => break,
                }
            }
            if channel.on_closed(generation) {
                handler.on_close(channel.kind);
            }
        });

        Ok(())
    }

    async fn dispatch(&self, handler: &dyn FrameHandler, text: &str) {
        let result = match serde_json::from_str::<Value>(text) {
            Ok(payload) => handler.handle(payload).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            error!(channel = %self.kind, err = %e, frame = %text, "error handling websocket message");
            emit(
                &self.events,
                ConfirmEvent::FrameDropped { channel: self.kind, reason: e.to_string() },
            );
        }
    }

    /// Returns false when `generation` was already replaced by a newer
    /// connection; the newer session's timer, flag and prompt are left alone.
    fn on_closed(&self, generation: u64) -> bool {
        let current = self.generation.load(Ordering::SeqCst) == generation;
        self.loader.remove_loading_process();
        if current {
            if let Some(timer) = self.loading_timer.lock().take() {
                timer.abort();
            }
            self.waiting_for_pin.store(false, Ordering::SeqCst);
            let mut link = self.link.lock();
            if link.as_ref().is_some_and(|l| l.generation == generation) {
                *link = None;
            }
        } else {
            debug!(channel = %self.kind, generation, "late close from a replaced connection");
        }
        info!(channel = %self.kind, "websocket connection closed");
        emit(&self.events, ConfirmEvent::Closed { channel: self.kind });
        current
    }

    /// Close the connection. Closing twice, or closing a channel that never
    /// opened, does nothing. Errors from the socket are logged, not returned.
    pub fn close(&self) {
        let Some(link) = self.link.lock().take() else {
            debug!(channel = %self.kind, "close on a channel with no connection");
            return;
        };
        if link.socket.ready_state() == ReadyState::Closed {
            return;
        }
        if let Err(e) = link.socket.close() {
            warn!(channel = %self.kind, err = %e, "error closing websocket");
        }
    }

    /// Send a text frame. Never queues; a missing or non-open connection is
    /// logged and reported without touching the socket.
    pub fn send(&self, frame: &str) -> Result<(), ChannelError> {
        let socket = match self.link.lock().as_ref() {
            Some(link) => Arc::clone(&link.socket),
            None => {
                error!(channel = %self.kind, "{}", ChannelError::NotInitialized);
                return Err(ChannelError::NotInitialized);
            }
        };
        if socket.ready_state() != ReadyState::Open {
            error!(channel = %self.kind, "{}", ChannelError::NotOpen);
            return Err(ChannelError::NotOpen);
        }
        socket.send(frame.to_owned()).map_err(|e| {
            error!(channel = %self.kind, err = %e, "websocket send failed");
            ChannelError::SendFailed
        })
    }

    pub fn is_connected(&self) -> bool {
        self.link.lock().as_ref().is_some_and(|l| l.socket.ready_state() == ReadyState::Open)
    }

    /// Increment the loading tracker after `delay`, replacing any pending timer.
    pub fn schedule_loading(&self, delay: Duration) {
        let loader = Arc::clone(&self.loader);
        let deadline = tokio::time::Instant::now() + delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            loader.add_loading_process();
        });
        if let Some(prev) = self.loading_timer.lock().replace(timer) {
            prev.abort();
        }
    }

    pub fn mark_waiting_for_pin(&self) {
        self.waiting_for_pin.store(true, Ordering::SeqCst);
    }

    pub fn clear_waiting_for_pin(&self) {
        self.waiting_for_pin.store(false, Ordering::SeqCst);
    }

    pub fn is_waiting_for_pin(&self) -> bool {
        self.waiting_for_pin.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
