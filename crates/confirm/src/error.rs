// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Faults a confirmation channel reports to its caller.
///
/// Only `TransportOpen` ever escapes the core (as the connect rejection);
/// the send-side codes are returned for callers that want to know whether a
/// frame left, and are otherwise just logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelError {
    TransportOpen,
    NotInitialized,
    NotOpen,
    SendFailed,
}

impl ChannelError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportOpen => "TRANSPORT_OPEN",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NotOpen => "NOT_OPEN",
            Self::SendFailed => "SEND_FAILED",
        }
    }

    /// Human-readable message. The connect rejection is deliberately generic;
    /// the underlying cause is only logged.
    pub fn message(&self) -> &'static str {
        match self {
            Self::TransportOpen => "Websocket error.",
            Self::NotInitialized => "WebSocket is not initialized.",
            Self::NotOpen => "WebSocket connection is not open.",
            Self::SendFailed => "WebSocket send failed.",
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ChannelError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
