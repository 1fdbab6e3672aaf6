// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public facade: both channels, their flows, and the shared router.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::channel::{Channel, ChannelKind, TokenProvider};
use crate::error::ChannelError;
use crate::event::{ConfirmEvent, EventSender};
use crate::flow::notification::NotificationFlow;
use crate::flow::pin::PinFlow;
use crate::flow::{FlowSettings, Services};
use crate::i18n::Translator;
use crate::loader::LoadingTracker;
use crate::prompt::{ErrorAlerter, Prompter};
use crate::router::Router;
use crate::transport::Connector;

/// External collaborators the service is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub connector: Arc<dyn Connector>,
    pub tokens: Arc<dyn TokenProvider>,
    pub loader: Arc<dyn LoadingTracker>,
    pub translator: Arc<dyn Translator>,
    pub prompter: Arc<dyn Prompter>,
    pub alerter: Arc<dyn ErrorAlerter>,
}

pub struct ConfirmationService {
    pin: Arc<Channel>,
    notification: Arc<Channel>,
    pin_flow: Arc<PinFlow>,
    notification_flow: Arc<NotificationFlow>,
    router: Arc<Router>,
    events: EventSender,
}

impl ConfirmationService {
    pub fn new(base_url: &str, collab: Collaborators, settings: FlowSettings) -> Self {
        let (events, _) = broadcast::channel(256);
        let channel = |kind| {
            Channel::new(
                kind,
                base_url,
                Arc::clone(&collab.connector),
                Arc::clone(&collab.tokens),
                Arc::clone(&collab.loader),
                events.clone(),
            )
        };
        let pin = channel(ChannelKind::Pin);
        let notification = channel(ChannelKind::Notification);

        let services = Services {
            translator: collab.translator,
            prompter: collab.prompter,
            alerter: collab.alerter,
        };
        let pin_flow = PinFlow::new(Arc::clone(&pin), services.clone(), settings, events.clone());
        let notification_flow =
            NotificationFlow::new(Arc::clone(&notification), services, settings, events.clone());
        let router = Router::new(Arc::clone(&pin_flow), Arc::clone(&notification_flow));

        Self { pin, notification, pin_flow, notification_flow, router, events }
    }

    /// Observe channel and flow activity.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfirmEvent> {
        self.events.subscribe()
    }

    pub fn channel(&self, kind: ChannelKind) -> &Arc<Channel> {
        match kind {
            ChannelKind::Pin => &self.pin,
            ChannelKind::Notification => &self.notification,
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn pin_flow(&self) -> &Arc<PinFlow> {
        &self.pin_flow
    }

    pub fn notification_flow(&self) -> &Arc<NotificationFlow> {
        &self.notification_flow
    }

    pub async fn connect(&self, kind: ChannelKind) -> Result<(), ChannelError> {
        let router = Arc::clone(&self.router);
        self.channel(kind).connect(router).await
    }

    pub async fn connect_pin(&self) -> Result<(), ChannelError> {
        self.connect(ChannelKind::Pin).await
    }

    pub async fn connect_notification(&self) -> Result<(), ChannelError> {
        self.connect(ChannelKind::Notification).await
    }

    pub fn close(&self, kind: ChannelKind) {
        match kind {
            ChannelKind::Pin => self.close_pin(),
            ChannelKind::Notification => self.close_notification(),
        }
    }

    pub fn close_pin(&self) {
        self.pin.clear_waiting_for_pin();
        self.pin.close();
    }

    pub fn close_notification(&self) {
        self.notification.close();
    }

    pub fn send_pin_message(&self, frame: &str) -> Result<(), ChannelError> {
        self.pin.send(frame)
    }

    pub fn send_notification_message(&self, frame: &str) -> Result<(), ChannelError> {
        self.notification.send(frame)
    }

    /// True while a PIN prompt is waiting for the user.
    pub fn is_waiting_for_pin(&self) -> bool {
        self.pin.is_waiting_for_pin()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
