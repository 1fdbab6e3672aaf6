// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain = { "hello", "hello" },
    line_breaks = { "a<br>b<br/>c<br />d", "a\nb\nc\nd" },
    counter = {
        "Enter it<br><small class=\"counter\">Time remaining: 5 seconds</small>",
        "Enter it\nTime remaining: 5 seconds"
    },
    preview_block = {
        "New<div style=\"margin-top:10px\">Holder: A &amp; B<br/>&bull; Run<br/></div>",
        "New\nHolder: A & B\n* Run"
    },
    entities = { "&lt;b&gt; &quot;q&quot; it&#39;s", "<b> \"q\" it's" },
    double_escape_stays_single = { "&amp;lt;", "&lt;" },
)]
fn reduces_html_to_text(html: &str, expected: &str) {
    assert_eq!(html_to_text(html), expected);
}

#[tokio::test]
async fn acknowledgement_prompt_closes_on_dismiss() -> anyhow::Result<()> {
    let prompter = TerminalPrompter::new();
    let prompt = prompter
        .create(PromptOptions { message: "Credential accepted".to_owned(), ..PromptOptions::default() })
        .await?;
    prompt.present().await?;

    prompt.set_message("updated".to_owned());
    assert_eq!(prompt.message(), "updated");

    prompt.dismiss();
    prompt.dismiss();
    assert_eq!(prompt.dismissed().await, Dismissal::Dismissed);
    Ok(())
}

#[tokio::test]
async fn alerter_completes() {
    TerminalAlerter.show_error_alert("The session has expired.".to_owned()).await;
}
