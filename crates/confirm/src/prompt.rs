// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive prompt capability and the per-request prompt session.
//!
//! Rendering is someone else's job: flows describe a prompt with
//! [`PromptOptions`], hand it to a [`Prompter`], and learn how it closed from
//! [`Prompt::dismissed`]. The [`PromptSession`] owns everything one request
//! needs while it waits for the user: the prompt, its countdown, and the
//! state that tells a user action apart from an expiry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::countdown::Countdown;
use crate::transport::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    Cancel,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptButton {
    /// Stable identifier reported back in [`Dismissal::Action`].
    pub id: &'static str,
    pub text: String,
    pub role: Option<ButtonRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInput {
    pub name: &'static str,
    pub placeholder: String,
    /// Restrict entry to digits.
    pub numeric: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    pub header: Option<String>,
    /// Rich-text body; all interpolated server text is already escaped.
    pub message: String,
    pub inputs: Vec<PromptInput>,
    pub buttons: Vec<PromptButton>,
    /// Whether tapping outside the prompt may close it.
    pub backdrop_dismiss: bool,
    pub css_class: Option<String>,
}

/// How a prompt closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dismissal {
    /// The user pressed a button. `values` holds the input fields by name.
    Action { button: String, values: BTreeMap<String, String> },
    /// Closed without a button: programmatic dismiss, expiry, or backdrop.
    Dismissed,
}

/// A created prompt.
pub trait Prompt: Send + Sync {
    fn present(&self) -> BoxFuture<'_, anyhow::Result<()>>;
    fn message(&self) -> String;
    /// Replace the live message (the countdown rewrites it every tick).
    fn set_message(&self, message: String);
    /// Force-close. Closing an already-closed prompt does nothing.
    fn dismiss(&self);
    /// Resolves once the prompt has closed, by any means.
    fn dismissed(&self) -> BoxFuture<'_, Dismissal>;
}

/// Prompt factory.
pub trait Prompter: Send + Sync {
    fn create(&self, options: PromptOptions) -> BoxFuture<'_, anyhow::Result<Arc<dyn Prompt>>>;
}

/// Shows user-visible error notices.
pub trait ErrorAlerter: Send + Sync {
    fn show_error_alert(&self, message: String) -> BoxFuture<'_, ()>;
}

/// Shared state for prompt implementations: the live message and a
/// first-writer-wins outcome slot.
pub struct PromptCore {
    message: Mutex<String>,
    outcome: watch::Sender<Option<Dismissal>>,
}

impl PromptCore {
    pub fn new(message: String) -> Self {
        let (outcome, _) = watch::channel(None);
        Self { message: Mutex::new(message), outcome }
    }

    pub fn message(&self) -> String {
        self.message.lock().clone()
    }

    pub fn set_message(&self, message: String) {
        *self.message.lock() = message;
    }

    /// Record how the prompt closed. Returns false if it was already closed.
    pub fn resolve(&self, dismissal: Dismissal) -> bool {
        self.outcome.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(dismissal);
            true
        })
    }

    pub fn outcome(&self) -> Option<Dismissal> {
        self.outcome.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    pub async fn wait(&self) -> Dismissal {
        let mut rx = self.outcome.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(dismissal) = current {
                return dismissal;
            }
            if rx.changed().await.is_err() {
                return Dismissal::Dismissed;
            }
        }
    }
}

/// Where a prompt session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Shown, counting down, no answer yet.
    Waiting,
    /// Closed by an explicit button press.
    UserAction,
    /// Closed without a button (countdown ran out or dismissed externally).
    Expired,
    /// Replaced by a newer request on the same flow.
    Superseded,
}

/// Per-request state: the prompt, its countdown, and how it ended.
pub struct PromptSession {
    prompt: Arc<dyn Prompt>,
    countdown: Mutex<Option<Countdown>>,
    state: Mutex<SessionState>,
}

impl PromptSession {
    pub fn new(prompt: Arc<dyn Prompt>) -> Arc<Self> {
        Arc::new(Self {
            prompt,
            countdown: Mutex::new(None),
            state: Mutex::new(SessionState::Waiting),
        })
    }

    pub fn prompt(&self) -> &Arc<dyn Prompt> {
        &self.prompt
    }

    pub fn attach_countdown(&self, countdown: Countdown) {
        if let Some(prev) = self.countdown.lock().replace(countdown) {
            prev.stop();
        }
    }

    /// Stop the countdown. Safe to call any number of times.
    pub fn stop_countdown(&self) {
        if let Some(countdown) = self.countdown.lock().as_ref() {
            countdown.stop();
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_waiting(&self) -> bool {
        self.state() == SessionState::Waiting
    }

    /// True only when a button press ended the session.
    pub fn closed_by_user(&self) -> bool {
        self.state() == SessionState::UserAction
    }

    /// Leave `Waiting`. Returns false if the session already ended.
    fn finish(&self, next: SessionState) -> bool {
        let mut state = self.state.lock();
        if *state != SessionState::Waiting {
            return false;
        }
        *state = next;
        true
    }

    /// Apply the prompt's dismissal and return the final state.
    ///
    /// The countdown is always stopped. A session that already ended keeps
    /// its state, so a late dismissal of a superseded prompt stays inert.
    pub fn resolve(&self, dismissal: &Dismissal) -> SessionState {
        let next = match dismissal {
            Dismissal::Action { .. } => SessionState::UserAction,
            Dismissal::Dismissed => SessionState::Expired,
        };
        self.finish(next);
        self.stop_countdown();
        self.state()
    }

    /// End this session in favour of a newer one and close its prompt.
    pub fn supersede(&self) {
        if self.finish(SessionState::Superseded) {
            self.stop_countdown();
            self.prompt.dismiss();
        }
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
