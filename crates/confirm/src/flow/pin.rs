// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PIN entry: prompt for the transaction code, send it back, and turn on the
//! loading indicator shortly after.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{FlowSettings, Services};
use crate::channel::{Channel, ChannelKind};
use crate::countdown::{countdown_message, Countdown};
use crate::event::{emit, ConfirmEvent, EventSender};
use crate::prompt::{
    ButtonRole, Dismissal, PromptButton, PromptInput, PromptOptions, PromptSession, SessionState,
};
use crate::protocol::{encode, PinRequest, PinResponse};

pub const CANCEL: &str = "cancel";
pub const SEND: &str = "send";
pub const PIN_INPUT: &str = "pin";

pub struct PinFlow {
    channel: Arc<Channel>,
    services: Services,
    settings: FlowSettings,
    events: EventSender,
    active: Mutex<Option<Arc<PromptSession>>>,
}

impl PinFlow {
    pub fn new(
        channel: Arc<Channel>,
        services: Services,
        settings: FlowSettings,
        events: EventSender,
    ) -> Arc<Self> {
        Arc::new(Self { channel, services, settings, events, active: Mutex::new(None) })
    }

    /// The session currently waiting for the user, if any.
    pub fn active(&self) -> Option<Arc<PromptSession>> {
        self.active.lock().clone()
    }

    /// Show the PIN prompt for `request`. Returns once the prompt is up; the
    /// user's answer is handled in the background.
    pub async fn handle(self: &Arc<Self>, request: PinRequest) -> anyhow::Result<()> {
        let secs = request.countdown_secs(self.settings.pin_default_timeout);
        self.channel.mark_waiting_for_pin();
        let shown = self.show(secs).await;
        if shown.is_err() {
            self.channel.clear_waiting_for_pin();
        }
        shown
    }

    async fn show(self: &Arc<Self>, secs: u64) -> anyhow::Result<()> {
        let translator = &self.services.translator;
        let description = translator.instant("confirmation.description", &[]);
        let options = PromptOptions {
            header: Some(translator.instant("confirmation.pin", &[])),
            message: countdown_message(translator.as_ref(), &description, secs),
            inputs: vec![PromptInput {
                name: PIN_INPUT,
                placeholder: "PIN".to_owned(),
                numeric: true,
            }],
            buttons: vec![
                PromptButton {
                    id: CANCEL,
                    text: translator.instant("confirmation.cancel", &[]),
                    role: Some(ButtonRole::Cancel),
                },
                PromptButton {
                    id: SEND,
                    text: translator.instant("confirmation.send", &[]),
                    role: None,
                },
            ],
            backdrop_dismiss: false,
            css_class: None,
        };

        let prompt = self.services.prompter.create(options).await?;
        let session = PromptSession::new(Arc::clone(&prompt));
        let previous = self.active.lock().replace(Arc::clone(&session));
        if let Some(previous) = previous {
            debug!("superseding pending pin prompt");
            previous.supersede();
        }
        session.attach_countdown(Countdown::start(
            Arc::clone(&prompt),
            Arc::clone(translator),
            description,
            secs,
            self.settings.tick,
        ));

        if let Err(e) = prompt.present().await {
            session.supersede();
            self.release(&session);
            return Err(e);
        }
        emit(&self.events, ConfirmEvent::PromptShown { flow: ChannelKind::Pin, timeout_secs: secs });

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            let dismissal = session.prompt().dismissed().await;
            flow.finish(&session, dismissal);
        });
        Ok(())
    }

    fn finish(&self, session: &Arc<PromptSession>, dismissal: Dismissal) {
        match session.resolve(&dismissal) {
            SessionState::UserAction => {
                if let Dismissal::Action { button, values } = dismissal {
                    match button.as_str() {
                        SEND => {
                            let pin = values.get(PIN_INPUT).cloned().unwrap_or_default();
                            self.send_pin(pin);
                        }
                        CANCEL => info!("pin entry cancelled"),
                        other => warn!(button = other, "unexpected pin prompt button"),
                    }
                }
            }
            SessionState::Expired => info!("pin prompt expired"),
            SessionState::Waiting | SessionState::Superseded => return,
        }
        self.channel.clear_waiting_for_pin();
        self.release(session);
    }

    fn send_pin(&self, pin: String) {
        self.channel.schedule_loading(self.settings.loading_delay);
        let frame = match encode(&PinResponse { pin }) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(err = %e, "failed to encode pin response");
                return;
            }
        };
        if self.channel.send(&frame).is_ok() {
            info!("pin sent");
            emit(&self.events, ConfirmEvent::PinSent);
        }
    }

    /// Drop the waiting session without answering, e.g. when its channel
    /// has closed underneath it.
    pub fn abandon(&self) {
        let previous = self.active.lock().take();
        if let Some(session) = previous {
            debug!("abandoning pin prompt");
            session.supersede();
        }
    }

    fn release(&self, session: &Arc<PromptSession>) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| Arc::ptr_eq(a, session)) {
            *active = None;
        }
    }
}

#[cfg(test)]
#[path = "pin_tests.rs"]
mod tests;
