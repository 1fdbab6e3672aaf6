// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::channel::ChannelKind;
use crate::flow::FlowSettings;
use crate::protocol::DEFAULT_TIMEOUT_SECS;

/// Wallet confirmation client: answers PIN and credential-offer requests
/// pushed over the wallet's websocket channels.
#[derive(Debug, Parser)]
#[command(name = "wallet-confirm", version, about)]
pub struct Config {
    /// Base websocket URL of the wallet API.
    #[arg(long, env = "WALLET_API_WEBSOCKET_EXTERNAL_URL", default_value = "ws://localhost:8082")]
    pub websocket_url: String,

    /// Opaque token sent as `{"id": ...}` when a channel opens.
    #[arg(long, env = "WALLET_TOKEN", default_value = "")]
    pub token: String,

    /// Language used when neither the stored preference nor the system locale is available.
    #[arg(long, env = "DEFAULT_LANG", default_value = "en")]
    pub default_lang: String,

    /// Stored UI language preference.
    #[arg(long, env = "WALLET_LANG")]
    pub lang: Option<String>,

    /// Directory of `<lang>.json` catalogs overriding the bundled ones.
    #[arg(long, env = "WALLET_I18N_DIR")]
    pub i18n_dir: Option<PathBuf>,

    /// Channels to open (pin, notification).
    #[arg(long, env = "WALLET_CHANNELS", value_delimiter = ',', default_value = "pin,notification")]
    pub channels: Vec<String>,

    /// Countdown for PIN requests without a timeout, in seconds.
    #[arg(long, env = "WALLET_PIN_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub pin_timeout: u64,

    /// Countdown for decision requests without a timeout, in seconds.
    #[arg(long, env = "WALLET_NOTIFICATION_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub notification_timeout: u64,

    /// Log format (json or text).
    #[arg(long, env = "WALLET_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "WALLET_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    // -- Duration overrides (skip from CLI; set in Config::test()) --------
    #[clap(skip)]
    pub tick_ms: Option<u64>,
    #[clap(skip)]
    pub loading_delay_ms: Option<u64>,
    #[clap(skip)]
    pub ack_dismiss_ms: Option<u64>,
}

fn env_duration_ms(var: &str, default: u64) -> Duration {
    let ms = std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default);
    Duration::from_millis(ms)
}

macro_rules! duration_field {
    ($method:ident, $field:ident, $env:literal, $default:expr) => {
        pub fn $method(&self) -> Duration {
            match self.$field {
                Some(ms) => Duration::from_millis(ms),
                None => env_duration_ms($env, $default),
            }
        }
    };
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.websocket_url.trim();
        if url.is_empty() {
            anyhow::bail!("--websocket-url must not be empty");
        }
        let rest = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"))
            .ok_or_else(|| anyhow::anyhow!("--websocket-url must start with ws:// or wss://"))?;
        if rest.trim_matches('/').is_empty() {
            anyhow::bail!("--websocket-url is missing a host");
        }

        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }

        if self.channel_kinds()?.is_empty() {
            anyhow::bail!("--channels must name at least one channel");
        }
        Ok(())
    }

    /// Parsed `--channels`, deduplicated, in the order given.
    pub fn channel_kinds(&self) -> anyhow::Result<Vec<ChannelKind>> {
        let mut kinds = Vec::new();
        for raw in self.channels.iter().filter(|c| !c.trim().is_empty()) {
            let kind: ChannelKind = raw.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            tick: self.tick(),
            loading_delay: self.loading_delay(),
            ack_dismiss: self.ack_dismiss(),
            pin_default_timeout: self.pin_timeout,
            notification_default_timeout: self.notification_timeout,
        }
    }

    duration_field!(tick, tick_ms, "WALLET_TICK_MS", 1_000);
    duration_field!(loading_delay, loading_delay_ms, "WALLET_LOADING_DELAY_MS", 1_000);
    duration_field!(ack_dismiss, ack_dismiss_ms, "WALLET_ACK_DISMISS_MS", 2_000);

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            websocket_url: "ws://127.0.0.1:0".into(),
            token: "test-token".into(),
            default_lang: "en".into(),
            lang: None,
            i18n_dir: None,
            channels: vec!["pin".into(), "notification".into()],
            pin_timeout: DEFAULT_TIMEOUT_SECS,
            notification_timeout: DEFAULT_TIMEOUT_SECS,
            log_format: "json".into(),
            log_level: "debug".into(),
            tick_ms: Some(10),
            loading_delay_ms: Some(10),
            ack_dismiss_ms: Some(20),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
