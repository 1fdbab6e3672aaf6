// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wallet confirmation channels: the PIN and notification websockets, the
//! router that classifies server-initiated requests, and the time-boxed
//! prompt flows that answer them.

pub mod channel;
pub mod config;
pub mod countdown;
pub mod error;
pub mod event;
pub mod flow;
pub mod i18n;
pub mod loader;
pub mod prompt;
pub mod protocol;
pub mod render;
pub mod router;
pub mod service;
pub mod terminal;
pub mod test_support;
pub mod transport;
