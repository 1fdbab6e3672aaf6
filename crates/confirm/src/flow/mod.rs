// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response/timeout state machines, one per channel purpose.

pub mod notification;
pub mod pin;

use std::sync::Arc;
use std::time::Duration;

use crate::i18n::Translator;
use crate::prompt::{ErrorAlerter, Prompter};
use crate::protocol::DEFAULT_TIMEOUT_SECS;

/// UI collaborators shared by both flows.
#[derive(Clone)]
pub struct Services {
    pub translator: Arc<dyn Translator>,
    pub prompter: Arc<dyn Prompter>,
    pub alerter: Arc<dyn ErrorAlerter>,
}

/// Timing knobs for the flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    /// Countdown period.
    pub tick: Duration,
    /// Delay before the loading indicator turns on after a PIN is sent.
    pub loading_delay: Duration,
    /// How long the accept/reject acknowledgement stays up.
    pub ack_dismiss: Duration,
    pub pin_default_timeout: u64,
    pub notification_default_timeout: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            loading_delay: Duration::from_millis(1000),
            ack_dismiss: Duration::from_millis(2000),
            pin_default_timeout: DEFAULT_TIMEOUT_SECS,
            notification_default_timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}
