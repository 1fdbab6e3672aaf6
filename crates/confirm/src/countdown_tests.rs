// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::prompt::{PromptOptions, Prompter};
use crate::test_support::{settle, MockPrompt, MockPrompter, MockTranslator};

const TICK: Duration = Duration::from_secs(1);

struct EchoTranslator;

impl Translator for EchoTranslator {
    fn instant(&self, key: &str, _params: &[(&str, &str)]) -> String {
        key.to_owned()
    }

    fn current_lang(&self) -> Option<String> {
        None
    }
}

async fn start(secs: u64) -> anyhow::Result<(Countdown, Arc<MockPrompt>)> {
    let prompter = MockPrompter::new();
    let prompt = prompter.create(PromptOptions::default()).await?;
    let mock = prompter.last().ok_or_else(|| anyhow::anyhow!("no prompt created"))?;
    let countdown = Countdown::start(prompt, Arc::new(MockTranslator), "desc".to_owned(), secs, TICK);
    Ok((countdown, mock))
}

async fn tick() {
    tokio::time::advance(TICK).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn counts_down_then_dismisses_once() -> anyhow::Result<()> {
    let (countdown, prompt) = start(3).await?;

    tick().await;
    assert_eq!(countdown.remaining(), 2);
    tick().await;
    assert_eq!(countdown.remaining(), 1);
    assert_eq!(prompt.dismiss_calls(), 0);

    let history = prompt.message_history();
    assert_eq!(history.len(), 2);
    assert!(history[0].contains("Time remaining: 2 seconds"));
    assert!(history[1].contains("Time remaining: 1 seconds"));
    assert!(history[1].starts_with("desc<br>"));

    tick().await;
    assert_eq!(countdown.remaining(), 0);
    assert!(countdown.is_stopped());
    assert_eq!(prompt.dismiss_calls(), 1);
    // No rewrite on the tick that expires.
    assert_eq!(prompt.message_history().len(), 2);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(prompt.dismiss_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn n_minus_one_ticks_show_one() -> anyhow::Result<()> {
    for n in 1..=6u64 {
        let (countdown, prompt) = start(n).await?;
        for _ in 1..n {
            tick().await;
        }
        assert_eq!(countdown.remaining(), 1, "n = {n}");
        assert_eq!(prompt.dismiss_calls(), 0, "n = {n}");
        if n > 1 {
            let last = prompt.message_history().pop().unwrap_or_default();
            assert!(last.contains("Time remaining: 1 seconds"), "n = {n}: {last}");
        }

        tick().await;
        assert_eq!(prompt.dismiss_calls(), 1, "n = {n}");
        assert_eq!(prompt.message_history().len() as u64, n - 1, "n = {n}");
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_start_dismisses_on_first_tick() -> anyhow::Result<()> {
    let (countdown, prompt) = start(0).await?;
    tick().await;
    assert_eq!(prompt.dismiss_calls(), 1);
    assert!(prompt.message_history().is_empty());
    assert_eq!(countdown.remaining(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_freezes_the_counter() -> anyhow::Result<()> {
    let (countdown, prompt) = start(5).await?;
    tick().await;
    countdown.stop();
    countdown.stop();
    assert!(countdown.is_stopped());

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(countdown.remaining(), 4);
    assert_eq!(prompt.message_history().len(), 1);
    assert_eq!(prompt.dismiss_calls(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_ticking() -> anyhow::Result<()> {
    let (countdown, prompt) = start(5).await?;
    drop(countdown);
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert!(prompt.message_history().is_empty());
    assert_eq!(prompt.dismiss_calls(), 0);
    Ok(())
}

#[test]
fn message_uses_template() {
    let message = countdown_message(&MockTranslator, "A PIN has been sent", 7);
    assert_eq!(
        message,
        "A PIN has been sent<br><small class=\"counter\">Time remaining: 7 seconds</small>"
    );
}

#[test]
fn message_falls_back_without_template() {
    assert_eq!(countdown_message(&EchoTranslator, "desc", 4), "desc<br/><br/><b>4</b>");
}
