// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classifies inbound payloads and hands each to exactly one flow.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::channel::{ChannelKind, FrameHandler};
use crate::flow::notification::NotificationFlow;
use crate::flow::pin::PinFlow;
use crate::protocol::Inbound;
use crate::transport::BoxFuture;

pub struct Router {
    pin: Arc<PinFlow>,
    notification: Arc<NotificationFlow>,
}

impl Router {
    pub fn new(pin: Arc<PinFlow>, notification: Arc<NotificationFlow>) -> Arc<Self> {
        Arc::new(Self { pin, notification })
    }

    pub async fn route(&self, payload: Value) -> anyhow::Result<()> {
        match Inbound::classify(payload.clone())? {
            Some(Inbound::Pin(request)) => self.pin.handle(request).await,
            Some(Inbound::Notification(request)) => self.notification.handle(request).await,
            None => {
                info!(%payload, "ignoring unknown message");
                Ok(())
            }
        }
    }
}

impl FrameHandler for Router {
    fn handle(&self, payload: Value) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(self.route(payload))
    }

    fn on_close(&self, channel: ChannelKind) {
        match channel {
            ChannelKind::Pin => self.pin.abandon(),
            ChannelKind::Notification => self.notification.abandon(),
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
