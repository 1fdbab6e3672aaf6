// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    transport_open = { ChannelError::TransportOpen, "TRANSPORT_OPEN", "Websocket error." },
    not_initialized = { ChannelError::NotInitialized, "NOT_INITIALIZED", "WebSocket is not initialized." },
    not_open = { ChannelError::NotOpen, "NOT_OPEN", "WebSocket connection is not open." },
    send_failed = { ChannelError::SendFailed, "SEND_FAILED", "WebSocket send failed." },
)]
fn codes_and_messages(err: ChannelError, code: &str, message: &str) {
    assert_eq!(err.as_str(), code);
    assert_eq!(err.to_string(), message);
}

#[test]
fn converts_into_anyhow() {
    let result: anyhow::Result<()> = Err(ChannelError::TransportOpen.into());
    crate::assert_err_contains!(result, "Websocket error.");
}
