// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential-offer decision: show the preview, send ACCEPTED or REJECTED,
//! close the channel, and acknowledge. An unattended prompt ends the session
//! with an error notice instead.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{FlowSettings, Services};
use crate::channel::{Channel, ChannelKind};
use crate::countdown::{countdown_message, Countdown};
use crate::event::{emit, ConfirmEvent, EventSender};
use crate::prompt::{ButtonRole, Dismissal, PromptButton, PromptOptions, PromptSession, SessionState};
use crate::protocol::{encode, Decision, DecisionResponse, NotificationRequest};
use crate::render::preview_html;

pub const REJECT: &str = "reject";
pub const ACCEPT: &str = "accept";

/// CSS class of the transient acknowledgement prompt.
pub const ACK_CSS_CLASS: &str = "custom-alert-ok";

pub struct NotificationFlow {
    channel: Arc<Channel>,
    services: Services,
    settings: FlowSettings,
    events: EventSender,
    active: Mutex<Option<Arc<PromptSession>>>,
}

impl NotificationFlow {
    pub fn new(
        channel: Arc<Channel>,
        services: Services,
        settings: FlowSettings,
        events: EventSender,
    ) -> Arc<Self> {
        Arc::new(Self { channel, services, settings, events, active: Mutex::new(None) })
    }

    pub fn active(&self) -> Option<Arc<PromptSession>> {
        self.active.lock().clone()
    }

    /// Show the decision prompt for `request`.
    pub async fn handle(self: &Arc<Self>, request: NotificationRequest) -> anyhow::Result<()> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let secs = request.countdown_secs(self.settings.notification_default_timeout, now_ms);
        debug!(decision = %request.decision, secs, "decision request received");

        let translator = &self.services.translator;
        let mut description = translator.instant("confirmation.new-credential", &[]);
        if let Some(preview) = &request.credential_preview {
            description.push_str(&preview_html(preview, translator.as_ref()));
        }

        let options = PromptOptions {
            header: Some(translator.instant("confirmation.new-credential-title", &[])),
            message: countdown_message(translator.as_ref(), &description, secs),
            inputs: Vec::new(),
            buttons: vec![
                PromptButton {
                    id: REJECT,
                    text: translator.instant("confirmation.cancel", &[]),
                    role: Some(ButtonRole::Cancel),
                },
                PromptButton {
                    id: ACCEPT,
                    text: translator.instant("confirmation.accept", &[]),
                    role: Some(ButtonRole::Confirm),
                },
            ],
            backdrop_dismiss: false,
            css_class: None,
        };

        let prompt = self.services.prompter.create(options).await?;
        let session = PromptSession::new(Arc::clone(&prompt));
        let previous = self.active.lock().replace(Arc::clone(&session));
        if let Some(previous) = previous {
            debug!("superseding pending decision prompt");
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
        emit(
            &self.events,
            ConfirmEvent::PromptShown { flow: ChannelKind::Notification, timeout_secs: secs },
        );

        let flow = Arc::clone(self);
        tokio::spawn(async move {
            let dismissal = session.prompt().dismissed().await;
            flow.finish(&session, dismissal).await;
        });
        Ok(())
    }

    async fn finish(&self, session: &Arc<PromptSession>, dismissal: Dismissal) {
        let state = session.resolve(&dismissal);
        if matches!(state, SessionState::Waiting | SessionState::Superseded) {
            return;
        }
        self.release(session);

        match (state, dismissal) {
            (SessionState::UserAction, Dismissal::Action { button, .. }) => {
                match button.as_str() {
                    ACCEPT => self.decide(Decision::Accepted).await,
                    REJECT => self.decide(Decision::Rejected).await,
                    other => {
                        warn!(button = other, "unexpected decision prompt button");
                        self.channel.close();
                    }
                }
            }
            _ => self.expire().await,
        }
    }

    async fn decide(&self, decision: Decision) {
        match encode(&DecisionResponse { decision }) {
            Ok(frame) => {
                if self.channel.send(&frame).is_ok() {
                    info!(%decision, "decision sent");
                    emit(&self.events, ConfirmEvent::DecisionSent { decision });
                }
            }
            Err(e) => warn!(err = %e, "failed to encode decision"),
        }
        self.channel.close();

        let key = match decision {
            Decision::Accepted => "home.ok-msg",
            Decision::Rejected => "home.rejected-msg",
        };
        self.acknowledge(self.services.translator.instant(key, &[])).await;
    }

    async fn acknowledge(&self, message: String) {
        let options = PromptOptions {
            message,
            backdrop_dismiss: true,
            css_class: Some(ACK_CSS_CLASS.to_owned()),
            ..PromptOptions::default()
        };
        let prompt = match self.services.prompter.create(options).await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(err = %e, "failed to create acknowledgement");
                return;
            }
        };
        if let Err(e) = prompt.present().await {
            warn!(err = %e, "failed to present acknowledgement");
            return;
        }
        let delay = self.settings.ack_dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            prompt.dismiss();
        });
    }

    async fn expire(&self) {
        info!("decision prompt closed without an answer; session expired");
        self.channel.close();
        emit(&self.events, ConfirmEvent::SessionExpired);
        let message = self.services.translator.instant("errors.session-expired", &[]);
        self.services.alerter.show_error_alert(message).await;
    }

    /// Drop the waiting session without answering, e.g. when its channel
    /// has closed underneath it.
    pub fn abandon(&self) {
        let previous = self.active.lock().take();
        if let Some(session) = previous {
            debug!("abandoning decision prompt");
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
#[path = "notification_tests.rs"]
mod tests;
