// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages exchanged over the confirmation channels.
//!
//! Inbound requests are server-initiated and loosely shaped, so they are
//! classified structurally (which discriminating field is present) rather
//! than by a tag, and every optional field is parsed leniently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Countdown used when a request carries no usable `timeout`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A classified inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Pin(PinRequest),
    Notification(NotificationRequest),
}

impl Inbound {
    /// Classify a decoded payload.
    ///
    /// `tx_code` present and not null means a PIN request; otherwise
    /// `decision` present and not null means a notification request. Anything
    /// else is `Ok(None)`. Errors only when a recognised shape fails to parse.
    pub fn classify(payload: Value) -> anyhow::Result<Option<Self>> {
        if has_field(&payload, "tx_code") {
            return Ok(Some(Self::Pin(serde_json::from_value(payload)?)));
        }
        if has_field(&payload, "decision") {
            return Ok(Some(Self::Notification(serde_json::from_value(payload)?)));
        }
        Ok(None)
    }
}

fn has_field(payload: &Value, name: &str) -> bool {
    payload.get(name).is_some_and(|v| !v.is_null())
}

/// Server asks the holder for the transaction code it received out of band.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PinRequest {
    pub tx_code: Value,
    #[serde(default, deserialize_with = "lenient_secs")]
    pub timeout: Option<u64>,
}

impl PinRequest {
    /// Countdown start value; zero or missing falls back to `default`.
    pub fn countdown_secs(&self, default: u64) -> u64 {
        self.timeout.filter(|&t| t > 0).unwrap_or(default)
    }
}

/// Server asks the holder to accept or reject an incoming credential.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// Carried as context only; its presence is the discriminator.
    pub decision: Value,
    #[serde(default, deserialize_with = "lenient_secs")]
    pub timeout: Option<u64>,
    #[serde(default, deserialize_with = "lenient_preview")]
    pub credential_preview: Option<CredentialPreview>,
    /// Absolute deadline in epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub expires_at: Option<i64>,
}

impl NotificationRequest {
    /// Countdown start value.
    ///
    /// A positive `timeout` wins; otherwise the whole seconds left until
    /// `expires_at` (never negative); otherwise `default`.
    pub fn countdown_secs(&self, default: u64, now_ms: i64) -> u64 {
        if let Some(t) = self.timeout.filter(|&t| t > 0) {
            return t;
        }
        match self.expires_at {
            Some(deadline) => u64::try_from(deadline.saturating_sub(now_ms).max(0) / 1000).unwrap_or(0),
            None => default,
        }
    }
}

/// Read-only summary of the credential being offered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPreview {
    #[serde(default)]
    pub power: Vec<Power>,
    pub subject_name: Option<String>,
    pub organization: Option<String>,
    pub issuer: Option<String>,
    pub expiration_date: Option<String>,
}

/// One mandate power: a function within a domain and the actions it allows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Power {
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub action: Vec<String>,
}

/// Sent immediately after a channel opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEnvelope {
    pub id: String,
}

/// Reply to a [`PinRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinResponse {
    pub pin: String,
}

/// The holder's answer to a [`NotificationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply to a [`NotificationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionResponse {
    pub decision: Decision,
}

/// Serialize an outbound message into a text frame.
pub fn encode<T: Serialize>(message: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string(message)?)
}

// -- Lenient field parsers ----------------------------------------------------

fn lenient_secs<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(as_whole_number).and_then(|n| u64::try_from(n).ok()))
}

fn lenient_millis<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(as_whole_number))
}

fn as_whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_preview<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<Option<CredentialPreview>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match serde_json::from_value(v) {
            Ok(preview) => Ok(Some(preview)),
            Err(e) => {
                warn!(err = %e, "ignoring malformed credentialPreview");
                Ok(None)
            }
        },
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }
    Ok(match OneOrMany::deserialize(de)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
