// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde_json::json;

use super::*;
use crate::test_support::{settle, Harness, MockPrompt, MockSocket};

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

async fn request(h: &Harness, payload: serde_json::Value) -> anyhow::Result<(Arc<MockSocket>, Arc<MockPrompt>)> {
    let socket = h.open(ChannelKind::Pin).await?;
    socket.push_json(&payload);
    settle().await;
    let prompt = h.prompter.last().ok_or_else(|| anyhow::anyhow!("no prompt shown"))?;
    Ok((socket, prompt))
}

#[tokio::test(start_paused = true)]
async fn send_transmits_pin_then_arms_loading() -> anyhow::Result<()> {
    let h = Harness::new();
    let (socket, prompt) = request(&h, json!({"tx_code": {}, "timeout": 3})).await?;

    let options = prompt.options();
    assert_eq!(options.header.as_deref(), Some("confirmation.pin"));
    assert!(options.message.contains("Time remaining: 3 seconds"));
    assert!(!options.backdrop_dismiss);
    assert_eq!(options.inputs.len(), 1);
    assert!(options.inputs[0].numeric);
    let buttons: Vec<_> = options.buttons.iter().map(|b| (b.id, b.text.as_str(), b.role)).collect();
    assert_eq!(
        buttons,
        vec![(CANCEL, "Cancel", Some(ButtonRole::Cancel)), (SEND, "Send", None)]
    );
    assert_eq!(prompt.presented(), 1);
    assert!(h.service.is_waiting_for_pin());

    advance(1000).await;
    advance(1000).await;
    let history = prompt.message_history();
    assert_eq!(history.len(), 2);
    assert!(history[0].contains("Time remaining: 2 seconds"));
    assert!(history[1].contains("Time remaining: 1 seconds"));

    prompt.press(SEND, &[(PIN_INPUT, "1234")]);
    settle().await;
    assert_eq!(socket.sent_json(), vec![json!({"pin": "1234"})]);
    assert!(!h.service.is_waiting_for_pin());
    assert_eq!(h.loader.adds(), 0);

    advance(999).await;
    assert_eq!(h.loader.adds(), 0);
    advance(1).await;
    assert_eq!(h.loader.adds(), 1);

    // Countdown stopped: no expiry later on.
    advance(10_000).await;
    assert_eq!(prompt.dismiss_calls(), 0);
    assert_eq!(prompt.message_history().len(), 2);
    assert_eq!(h.loader.adds(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_sends_nothing() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let (socket, prompt) = request(&h, json!({"tx_code": "abc", "timeout": 30})).await?;

    prompt.press(CANCEL, &[(PIN_INPUT, "99")]);
    settle().await;
    advance(5_000).await;

    assert!(socket.sent_json().is_empty());
    assert_eq!(h.loader.adds(), 0);
    assert!(!h.service.is_waiting_for_pin());
    assert!(h.service.pin_flow().active().is_none());
    assert!(!h.drain_events().contains(&ConfirmEvent::PinSent));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn expiry_dismisses_without_network_traffic() -> anyhow::Result<()> {
    let h = Harness::new();
    let (socket, prompt) = request(&h, json!({"tx_code": {}, "timeout": 2})).await?;

    advance(1000).await;
    assert_eq!(prompt.dismiss_calls(), 0);
    advance(1000).await;
    assert_eq!(prompt.dismiss_calls(), 1);

    assert!(socket.sent_json().is_empty());
    assert!(h.alerter.messages().is_empty());
    assert!(!h.service.is_waiting_for_pin());
    assert!(h.service.channel(ChannelKind::Pin).is_connected());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_timeout_uses_default() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let (_, prompt) = request(&h, json!({"tx_code": {}})).await?;

    assert!(prompt.options().message.contains("Time remaining: 60 seconds"));
    assert!(h
        .drain_events()
        .contains(&ConfirmEvent::PromptShown { flow: ChannelKind::Pin, timeout_secs: 60 }));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn newer_request_supersedes_pending_prompt() -> anyhow::Result<()> {
    let h = Harness::new();
    let (socket, first) = request(&h, json!({"tx_code": {}, "timeout": 30})).await?;

    socket.push_json(&json!({"tx_code": {}, "timeout": 30}));
    settle().await;
    let second = h.prompter.last().ok_or_else(|| anyhow::anyhow!("no second prompt"))?;

    assert_eq!(h.prompter.count(), 2);
    assert_eq!(first.dismiss_calls(), 1);
    assert!(h.service.is_waiting_for_pin());

    advance(2_000).await;
    assert!(first.message_history().is_empty());
    assert_eq!(second.message_history().len(), 2);

    second.press(SEND, &[(PIN_INPUT, "4321")]);
    settle().await;
    assert_eq!(socket.sent_json(), vec![json!({"pin": "4321"})]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn prompt_failure_is_logged_and_dropped() -> anyhow::Result<()> {
    let mut h = Harness::new();
    h.prompter.set_failing(true);
    let socket = h.open(ChannelKind::Pin).await?;

    socket.push_json(&json!({"tx_code": {}}));
    settle().await;

    assert!(!h.service.is_waiting_for_pin());
    assert!(h.service.channel(ChannelKind::Pin).is_connected());
    assert!(h
        .drain_events()
        .iter()
        .any(|e| matches!(e, ConfirmEvent::FrameDropped { channel: ChannelKind::Pin, .. })));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn send_after_channel_closed_is_dropped() -> anyhow::Result<()> {
    let mut h = Harness::new();
    h.service.router().route(json!({"tx_code": {}, "timeout": 10})).await?;
    let prompt = h.prompter.last().ok_or_else(|| anyhow::anyhow!("no prompt"))?;

    prompt.press(SEND, &[(PIN_INPUT, "1111")]);
    settle().await;

    assert!(!h.drain_events().contains(&ConfirmEvent::PinSent));
    assert!(!h.service.is_waiting_for_pin());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn late_close_of_replaced_connection_keeps_new_prompt() -> anyhow::Result<()> {
    let h = Harness::new();
    let old = h.open(ChannelKind::Pin).await?;
    old.fail_close();
    h.service.close_pin();

    let (_new, prompt) = request(&h, json!({"tx_code": {}, "timeout": 30})).await?;
    assert!(h.service.is_waiting_for_pin());

    old.remote_close();
    settle().await;

    assert!(h.service.is_waiting_for_pin());
    assert!(!prompt.is_closed());
    assert!(h.service.channel(ChannelKind::Pin).is_connected());
    assert!(h.service.pin_flow().active().is_some());
    Ok(())
}
