// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured observability events.
//!
//! Every channel and flow records what it did on a shared broadcast sender.
//! Nobody is required to listen; send errors (no subscribers) are ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::channel::ChannelKind;
use crate::protocol::Decision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfirmEvent {
    /// A channel opened and sent its auth envelope.
    Opened { channel: ChannelKind },
    /// Opening a channel failed; the caller saw only the generic error.
    OpenFailed { channel: ChannelKind, reason: String },
    /// A channel's connection ended (locally or remotely).
    Closed { channel: ChannelKind },
    /// An inbound frame could not be decoded or handled.
    FrameDropped { channel: ChannelKind, reason: String },
    /// A flow showed a prompt with the given countdown.
    PromptShown { flow: ChannelKind, timeout_secs: u64 },
    /// A PIN left over the PIN channel.
    PinSent,
    /// A decision left over the notification channel.
    DecisionSent { decision: Decision },
    /// A notification prompt closed without a user action.
    SessionExpired,
}

impl ConfirmEvent {
    /// The channel this event concerns, if it is channel-scoped.
    pub fn channel(&self) -> Option<ChannelKind> {
        match self {
            Self::Opened { channel }
            | Self::OpenFailed { channel, .. }
            | Self::Closed { channel }
            | Self::FrameDropped { channel, .. } => Some(*channel),
            Self::PromptShown { flow, .. } => Some(*flow),
            Self::PinSent => Some(ChannelKind::Pin),
            Self::DecisionSent { .. } | Self::SessionExpired => Some(ChannelKind::Notification),
        }
    }
}

/// Sender half shared by channels and flows.
pub type EventSender = broadcast::Sender<ConfirmEvent>;

/// Record an event; a missing audience is not an error.
pub fn emit(tx: &EventSender, event: ConfirmEvent) {
    let _ = tx.send(event);
}
