// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::assert_err_contains;
use crate::test_support::{settle, Harness, TEST_BASE_URL, TEST_TOKEN};

#[tokio::test]
async fn connects_each_channel_to_its_path() -> anyhow::Result<()> {
    let h = Harness::new();
    h.service.connect_pin().await?;
    h.service.connect_notification().await?;

    assert_eq!(
        h.connector.urls(),
        vec![format!("{TEST_BASE_URL}/api/v1/pin"), format!("{TEST_BASE_URL}/api/v1/notification")]
    );
    for path in ["/api/v1/pin", "/api/v1/notification"] {
        let socket = h.connector.socket_for(path).ok_or_else(|| anyhow::anyhow!("no {path}"))?;
        assert_eq!(socket.sent(), vec![json!({"id": TEST_TOKEN}).to_string()]);
    }
    Ok(())
}

#[tokio::test]
async fn connect_failure_rejects_with_generic_error() {
    let mut h = Harness::new();
    h.connector.set_failing(true);

    assert_err_contains!(h.service.connect_notification().await, "Websocket error.");
    assert_eq!(h.service.connect_pin().await, Err(ChannelError::TransportOpen));

    let failures = h
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, ConfirmEvent::OpenFailed { .. }))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn send_guards_never_touch_the_socket() -> anyhow::Result<()> {
    let h = Harness::new();
    assert_eq!(h.service.send_pin_message("{}"), Err(ChannelError::NotInitialized));
    assert_eq!(h.service.send_notification_message("{}"), Err(ChannelError::NotInitialized));

    let socket = h.open(ChannelKind::Pin).await?;
    h.service.close_pin();
    assert_eq!(h.service.send_pin_message("{}"), Err(ChannelError::NotInitialized));
    assert_eq!(socket.send_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn channels_are_independent() -> anyhow::Result<()> {
    let h = Harness::new();
    let pin = h.open(ChannelKind::Pin).await?;
    let notification = h.open(ChannelKind::Notification).await?;

    h.service.close_notification();
    settle().await;

    assert!(h.service.channel(ChannelKind::Pin).is_connected());
    assert!(!h.service.channel(ChannelKind::Notification).is_connected());
    h.service.send_pin_message(r#"{"pin":"1"}"#)?;
    assert_eq!(pin.close_calls(), 0);
    assert_eq!(notification.close_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn double_close_is_harmless() -> anyhow::Result<()> {
    let h = Harness::new();
    let socket = h.open(ChannelKind::Notification).await?;

    h.service.close(ChannelKind::Notification);
    h.service.close(ChannelKind::Notification);
    h.service.close(ChannelKind::Pin);
    settle().await;

    assert_eq!(socket.close_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn close_pin_clears_waiting_flag() -> anyhow::Result<()> {
    let h = Harness::new();
    let socket = h.open(ChannelKind::Pin).await?;
    socket.push_json(&json!({"tx_code": {}, "timeout": 30}));
    settle().await;
    assert!(h.service.is_waiting_for_pin());

    h.service.close_pin();
    assert!(!h.service.is_waiting_for_pin());
    settle().await;
    assert_eq!(h.loader.removes(), 1);
    Ok(())
}

#[tokio::test]
async fn pin_request_on_notification_channel_replies_over_pin() -> anyhow::Result<()> {
    let h = Harness::new();
    let pin = h.open(ChannelKind::Pin).await?;
    let notification = h.open(ChannelKind::Notification).await?;

    notification.push_json(&json!({"tx_code": {}, "timeout": 30}));
    settle().await;
    let prompt = h.prompter.last().ok_or_else(|| anyhow::anyhow!("no prompt"))?;
    prompt.press(crate::flow::pin::SEND, &[(crate::flow::pin::PIN_INPUT, "2468")]);
    settle().await;

    assert_eq!(pin.sent_json(), vec![json!({"pin": "2468"})]);
    assert!(notification.sent_json().is_empty());
    Ok(())
}
