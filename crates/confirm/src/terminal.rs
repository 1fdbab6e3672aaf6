// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stdin/stdout prompt used by the binary.
//!
//! Rich text is reduced to plain lines. Buttons are numbered; the user types
//! the input fields first, then the number of a button.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::prompt::{Dismissal, ErrorAlerter, Prompt, PromptCore, PromptOptions, Prompter};
use crate::transport::BoxFuture;

type SharedStdin = Arc<tokio::sync::Mutex<BufReader<Stdin>>>;

pub struct TerminalPrompter {
    stdin: SharedStdin,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self { stdin: Arc::new(tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()))) }
    }
}

impl Prompter for TerminalPrompter {
    fn create(&self, options: PromptOptions) -> BoxFuture<'_, anyhow::Result<Arc<dyn Prompt>>> {
        let prompt: Arc<dyn Prompt> = Arc::new(TerminalPrompt {
            core: Arc::new(PromptCore::new(options.message.clone())),
            options,
            stdin: Arc::clone(&self.stdin),
            reader: Mutex::new(None),
        });
        Box::pin(async move { Ok(prompt) })
    }
}

struct TerminalPrompt {
    options: PromptOptions,
    core: Arc<PromptCore>,
    stdin: SharedStdin,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Prompt for TerminalPrompt {
    fn present(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut out = std::io::stdout().lock();
            writeln!(out)?;
            if let Some(header) = &self.options.header {
                writeln!(out, "== {} ==", html_to_text(header))?;
            }
            writeln!(out, "{}", html_to_text(&self.core.message()))?;
            for (i, button) in self.options.buttons.iter().enumerate() {
                writeln!(out, "  [{}] {}", i + 1, button.text)?;
            }
            out.flush()?;
            drop(out);

            if self.options.buttons.is_empty() {
                return Ok(());
            }
            let task = tokio::spawn(read_answer(
                Arc::clone(&self.stdin),
                Arc::clone(&self.core),
                self.options.clone(),
            ));
            if let Some(prev) = self.reader.lock().replace(task) {
                prev.abort();
            }
            Ok(())
        })
    }

    fn message(&self) -> String {
        self.core.message()
    }

    fn set_message(&self, message: String) {
        if !self.core.is_closed() {
            if let Some(line) = html_to_text(&message).lines().last() {
                println!("  {line}");
            }
        }
        self.core.set_message(message);
    }

    fn dismiss(&self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        if self.core.resolve(Dismissal::Dismissed) {
            debug!("terminal prompt dismissed");
        }
    }

    fn dismissed(&self) -> BoxFuture<'_, Dismissal> {
        Box::pin(self.core.wait())
    }
}

async fn read_answer(stdin: SharedStdin, core: Arc<PromptCore>, options: PromptOptions) {
    let mut stdin = stdin.lock().await;
    let mut values = BTreeMap::new();

    for input in &options.inputs {
        let value = loop {
            ask(&format!("{}: ", input.placeholder));
            let Some(line) = read_line(&mut stdin).await else {
                core.resolve(Dismissal::Dismissed);
                return;
            };
            if input.numeric && !line.chars().all(|c| c.is_ascii_digit()) {
                println!("  digits only");
                continue;
            }
            break line;
        };
        values.insert(input.name.to_owned(), value);
    }

    let count = options.buttons.len();
    loop {
        ask(&format!("choose [1-{count}]: "));
        let Some(line) = read_line(&mut stdin).await else {
            core.resolve(Dismissal::Dismissed);
            return;
        };
        let picked = line.parse::<usize>().ok().and_then(|n| options.buttons.get(n.wrapping_sub(1)));
        if let Some(button) = picked {
            core.resolve(Dismissal::Action { button: button.id.to_owned(), values });
            return;
        }
    }
}

fn ask(text: &str) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "{text}");
    let _ = out.flush();
}

/// Next trimmed line, or `None` at end of input.
async fn read_line(stdin: &mut BufReader<Stdin>) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_owned()),
        Err(e) => {
            error!(err = %e, "reading stdin");
            None
        }
    }
}

/// Prints error notices to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAlerter;

impl ErrorAlerter for TerminalAlerter {
    fn show_error_alert(&self, message: String) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            error!(%message, "error alert");
            eprintln!("error: {}", html_to_text(&message));
        })
    }
}

/// Reduce prompt rich text to plain text: line breaks and block ends become
/// newlines, other tags are dropped, and common entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut chars = html.chars();
    while let Some(c) = chars.next() {
        if c != '<' {
            text.push(c);
            continue;
        }
        let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
        let name = tag.trim_start_matches('/').trim().to_ascii_lowercase();
        let breaks = name.starts_with("br") || name.starts_with("div");
        if breaks && !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
    }
    text.replace("&bull;", "*")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim_end()
        .to_owned()
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
