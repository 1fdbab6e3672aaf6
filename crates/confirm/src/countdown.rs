// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-second countdown that keeps a prompt's message current and closes the
//! prompt when time runs out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::i18n::Translator;
use crate::prompt::Prompt;

/// Translation key for the "description + remaining seconds" body.
pub const MESSAGE_KEY: &str = "confirmation.messageHtml";

/// Handle to a running countdown.
///
/// Each tick decrements the counter. While it stays above zero the prompt's
/// message is rewritten with the new value; the tick that reaches zero stops
/// the countdown and dismisses the prompt without another rewrite.
#[derive(Debug)]
pub struct Countdown {
    cancel: CancellationToken,
    remaining: Arc<AtomicU64>,
}

impl Countdown {
    pub fn start(
        prompt: Arc<dyn Prompt>,
        translator: Arc<dyn Translator>,
        description: String,
        initial_secs: u64,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let remaining = Arc::new(AtomicU64::new(initial_secs));

        let task_cancel = cancel.clone();
        let task_remaining = Arc::clone(&remaining);
        let first_tick = Instant::now() + period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let left = task_remaining.load(Ordering::SeqCst).saturating_sub(1);
                        task_remaining.store(left, Ordering::SeqCst);
                        if left == 0 {
                            task_cancel.cancel();
                            prompt.dismiss();
                            break;
                        }
                        prompt.set_message(countdown_message(translator.as_ref(), &description, left));
                    }
                }
            }
        });

        Self { cancel, remaining }
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Compose the prompt body for `counter` seconds remaining.
///
/// Falls back to a plain layout when the catalog has no template.
pub fn countdown_message(translator: &dyn Translator, description: &str, counter: u64) -> String {
    let counter = counter.to_string();
    let message =
        translator.instant(MESSAGE_KEY, &[("description", description), ("counter", &counter)]);
    if message.is_empty() || message == MESSAGE_KEY {
        return format!("{description}<br/><br/><b>{counter}</b>");
    }
    message
}

#[cfg(test)]
#[path = "countdown_tests.rs"]
mod tests;
