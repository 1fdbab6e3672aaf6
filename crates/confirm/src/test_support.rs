// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: mocks, a service harness, and assertion helpers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use crate::channel::{ChannelKind, StaticToken};
use crate::event::ConfirmEvent;
use crate::flow::FlowSettings;
use crate::i18n::{interpolate, Translator};
use crate::loader::LoadingTracker;
use crate::prompt::{Dismissal, ErrorAlerter, Prompt, PromptCore, PromptOptions, Prompter};
use crate::service::{Collaborators, ConfirmationService};
use crate::transport::{BoxFuture, Connection, Connector, ReadyState, Socket, SocketEvent};

/// Let spawned tasks run until they block again.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// -- Transport ----------------------------------------------------------------

/// In-memory socket that records what it was asked to do.
pub struct MockSocket {
    state: Mutex<ReadyState>,
    sent: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
    send_calls: AtomicUsize,
    fail_close: AtomicBool,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl MockSocket {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SocketEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let socket = Arc::new(Self {
            state: Mutex::new(ReadyState::Open),
            sent: Mutex::new(Vec::new()),
            close_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            fail_close: AtomicBool::new(false),
            events,
        });
        (socket, rx)
    }

    /// Frames accepted by `send`, in order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent frames decoded as JSON, skipping the auth envelope.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .skip(1)
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        *self.state.lock() = state;
    }

    /// Make the next `close` calls fail.
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// Deliver an inbound text frame.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.events.send(SocketEvent::Text(text.into()));
    }

    pub fn push_json(&self, value: &Value) {
        self.push_text(value.to_string());
    }

    /// Simulate the server closing the connection.
    pub fn remote_close(&self) {
        *self.state.lock() = ReadyState::Closed;
        let _ = self.events.send(SocketEvent::Closed);
    }
}

impl Socket for MockSocket {
    fn ready_state(&self) -> ReadyState {
        *self.state.lock()
    }

    fn send(&self, text: String) -> anyhow::Result<()> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().push(text);
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            anyhow::bail!("close exploded");
        }
        self.remote_close();
        Ok(())
    }
}

/// Connector handing out [`MockSocket`]s, or failing on demand.
#[derive(Default)]
pub struct MockConnector {
    fail: AtomicBool,
    sockets: Mutex<Vec<(String, Arc<MockSocket>)>>,
}

impl MockConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn urls(&self) -> Vec<String> {
        self.sockets.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn last_socket(&self) -> Option<Arc<MockSocket>> {
        self.sockets.lock().last().map(|(_, s)| Arc::clone(s))
    }

    /// Most recent socket opened for a URL ending in `path`.
    pub fn socket_for(&self, path: &str) -> Option<Arc<MockSocket>> {
        self.sockets
            .lock()
            .iter()
            .rev()
            .find(|(url, _)| url.ends_with(path))
            .map(|(_, s)| Arc::clone(s))
    }
}

impl Connector for MockConnector {
    fn connect(&self, url: &str) -> BoxFuture<'_, anyhow::Result<Connection>> {
        let url = url.to_owned();
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("connection refused: {url}");
            }
            let (socket, events) = MockSocket::new();
            self.sockets.lock().push((url, Arc::clone(&socket)));
            Ok(Connection { socket, events })
        })
    }
}

// -- Prompts ------------------------------------------------------------------

pub struct MockPrompt {
    options: PromptOptions,
    core: PromptCore,
    presented: AtomicUsize,
    dismiss_calls: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

impl MockPrompt {
    fn new(options: PromptOptions) -> Self {
        Self {
            core: PromptCore::new(options.message.clone()),
            options,
            presented: AtomicUsize::new(0),
            dismiss_calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn dismiss_calls(&self) -> usize {
        self.dismiss_calls.load(Ordering::SeqCst)
    }

    /// Every message written through `set_message`, in order.
    pub fn message_history(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn outcome(&self) -> Option<Dismissal> {
        self.core.outcome()
    }

    /// Simulate the user pressing `button` with the given input values.
    pub fn press(&self, button: &str, values: &[(&str, &str)]) {
        let values: BTreeMap<String, String> =
            values.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        self.core.resolve(Dismissal::Action { button: button.to_owned(), values });
    }
}

impl Prompt for MockPrompt {
    fn present(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        self.presented.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }

    fn message(&self) -> String {
        self.core.message()
    }

    fn set_message(&self, message: String) {
        self.messages.lock().push(message.clone());
        self.core.set_message(message);
    }

    fn dismiss(&self) {
        self.dismiss_calls.fetch_add(1, Ordering::SeqCst);
        self.core.resolve(Dismissal::Dismissed);
    }

    fn dismissed(&self) -> BoxFuture<'_, Dismissal> {
        Box::pin(self.core.wait())
    }
}

#[derive(Default)]
pub struct MockPrompter {
    prompts: Mutex<Vec<Arc<MockPrompt>>>,
    fail: AtomicBool,
}

impl MockPrompter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<Arc<MockPrompt>> {
        self.prompts.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last(&self) -> Option<Arc<MockPrompt>> {
        self.prompts.lock().last().cloned()
    }
}

impl Prompter for MockPrompter {
    fn create(&self, options: PromptOptions) -> BoxFuture<'_, anyhow::Result<Arc<dyn Prompt>>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("prompter unavailable");
            }
            let prompt = Arc::new(MockPrompt::new(options));
            self.prompts.lock().push(Arc::clone(&prompt));
            let prompt: Arc<dyn Prompt> = prompt;
            Ok(prompt)
        })
    }
}

/// Records every error notice.
#[derive(Default)]
pub struct RecordingAlerter {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlerter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl ErrorAlerter for RecordingAlerter {
    fn show_error_alert(&self, message: String) -> BoxFuture<'_, ()> {
        self.messages.lock().push(message);
        Box::pin(async {})
    }
}

// -- Translation and loading --------------------------------------------------

/// Small fixed catalog; unknown keys echo back.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTranslator;

impl Translator for MockTranslator {
    fn instant(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = match key {
            "confirmation.cancel" => "Cancel",
            "confirmation.send" => "Send",
            "confirmation.accept" => "Accept",
            "confirmation.description" => "A PIN has been sent",
            "confirmation.messageHtml" => {
                "{{description}}<br><small class=\"counter\">Time remaining: {{counter}} seconds</small>"
            }
            "home.ok-msg" => "Credential accepted",
            "home.rejected-msg" => "Credential rejected",
            "errors.session-expired" => "Session expired",
            other => other,
        };
        interpolate(template, params)
    }

    fn current_lang(&self) -> Option<String> {
        Some("en".to_owned())
    }
}

/// Loading tracker that counts calls instead of tracking a level.
#[derive(Debug, Default)]
pub struct CountingLoader {
    adds: AtomicUsize,
    removes: AtomicUsize,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

impl LoadingTracker for CountingLoader {
    fn add_loading_process(&self) {
        self.adds.fetch_add(1, Ordering::SeqCst);
    }

    fn remove_loading_process(&self) {
        self.removes.fetch_add(1, Ordering::SeqCst);
    }
}

// -- Harness ------------------------------------------------------------------

pub const TEST_BASE_URL: &str = "ws://wallet.test";
pub const TEST_TOKEN: &str = "test-token";

/// A [`ConfirmationService`] wired to mocks, with handles to each mock.
pub struct Harness {
    pub service: ConfirmationService,
    pub connector: Arc<MockConnector>,
    pub loader: Arc<CountingLoader>,
    pub prompter: Arc<MockPrompter>,
    pub alerter: Arc<RecordingAlerter>,
    pub events: broadcast::Receiver<ConfirmEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(FlowSettings::default())
    }

    pub fn with_settings(settings: FlowSettings) -> Self {
        let connector = MockConnector::new();
        let loader = CountingLoader::new();
        let prompter = MockPrompter::new();
        let alerter = RecordingAlerter::new();
        let collab = Collaborators {
            connector: Arc::clone(&connector) as Arc<dyn Connector>,
            tokens: Arc::new(StaticToken(TEST_TOKEN.to_owned())),
            loader: Arc::clone(&loader) as Arc<dyn LoadingTracker>,
            translator: Arc::new(MockTranslator),
            prompter: Arc::clone(&prompter) as Arc<dyn Prompter>,
            alerter: Arc::clone(&alerter) as Arc<dyn ErrorAlerter>,
        };
        let service = ConfirmationService::new(TEST_BASE_URL, collab, settings);
        let events = service.subscribe();
        Self { service, connector, loader, prompter, alerter, events }
    }

    /// Connect `kind` and return its socket.
    pub async fn open(&self, kind: ChannelKind) -> anyhow::Result<Arc<MockSocket>> {
        self.service.connect(kind).await?;
        self.connector
            .socket_for(kind.path())
            .ok_or_else(|| anyhow::anyhow!("no socket opened for {kind}"))
    }

    /// Events recorded so far.
    pub fn drain_events(&mut self) -> Vec<ConfirmEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Drain pending events, keeping only those scoped to `kind`.
    pub fn drain_events_for(&mut self, kind: ChannelKind) -> Vec<ConfirmEvent> {
        self.drain_events().into_iter().filter(|e| e.channel() == Some(kind)).collect()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
