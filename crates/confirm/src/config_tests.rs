// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn defaults_are_valid() -> anyhow::Result<()> {
    let config = parse(&["wallet-confirm", "--websocket-url", "ws://localhost:8082"]);
    config.validate()?;
    assert_eq!(config.default_lang, "en");
    assert_eq!(config.channel_kinds()?, vec![ChannelKind::Pin, ChannelKind::Notification]);
    assert_eq!(config.pin_timeout, 60);
    assert_eq!(config.notification_timeout, 60);
    Ok(())
}

#[test]
fn channels_are_parsed_and_deduplicated() -> anyhow::Result<()> {
    let config = parse(&[
        "wallet-confirm",
        "--websocket-url",
        "wss://wallet.example",
        "--channels",
        "notification,pin,notification",
    ]);
    config.validate()?;
    assert_eq!(config.channel_kinds()?, vec![ChannelKind::Notification, ChannelKind::Pin]);
    Ok(())
}

#[test]
fn flags_override_defaults() -> anyhow::Result<()> {
    let config = parse(&[
        "wallet-confirm",
        "--websocket-url",
        "ws://10.0.0.1:9000",
        "--token",
        "abc",
        "--lang",
        "ca",
        "--log-format",
        "json",
        "--notification-timeout",
        "80",
    ]);
    config.validate()?;
    assert_eq!(config.token, "abc");
    assert_eq!(config.lang.as_deref(), Some("ca"));
    assert_eq!(config.flow_settings().notification_default_timeout, 80);
    Ok(())
}

#[yare::parameterized(
    empty_url = { Config { websocket_url: "  ".into(), ..Config::test() }, "must not be empty" },
    http_url = { Config { websocket_url: "http://x".into(), ..Config::test() }, "ws:// or wss://" },
    missing_host = { Config { websocket_url: "ws://".into(), ..Config::test() }, "missing a host" },
    log_format = { Config { log_format: "yaml".into(), ..Config::test() }, "invalid log format" },
    no_channels = { Config { channels: vec![], ..Config::test() }, "at least one channel" },
    unknown_channel = { Config { channels: vec!["sms".into()], ..Config::test() }, "unknown channel" },
)]
fn invalid_configs_are_rejected(config: Config, expected: &str) {
    crate::assert_err_contains!(config.validate(), expected);
}

#[test]
fn test_config_is_valid() -> anyhow::Result<()> {
    Config::test().validate()
}

#[test]
fn duration_overrides_win() {
    let config = Config::test();
    let settings = config.flow_settings();
    assert_eq!(settings.tick, Duration::from_millis(10));
    assert_eq!(settings.loading_delay, Duration::from_millis(10));
    assert_eq!(settings.ack_dismiss, Duration::from_millis(20));
}

#[test]
fn duration_defaults_without_overrides() {
    let config = Config { tick_ms: None, loading_delay_ms: None, ack_dismiss_ms: None, ..Config::test() };
    // Env vars are unset in the test environment.
    if std::env::var("WALLET_TICK_MS").is_err() {
        assert_eq!(config.tick(), Duration::from_secs(1));
    }
    if std::env::var("WALLET_ACK_DISMISS_MS").is_err() {
        assert_eq!(config.ack_dismiss(), Duration::from_millis(2000));
    }
}
