//! The conversation store.
//!
//! Owns the message list, the pending input and the single in-flight dispatch.
//! All mutation happens through `&mut self` on the owning task; the spawned
//! dispatch only reports back through its join handle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatch, DispatchError, Route};
use crate::state::{IdClock, Message, Role};

/// Shown as the assistant reply whenever a dispatch fails for any reason.
pub const FAILURE_MESSAGE: &str = "Failed to connect to the server. Please check your connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Closed,
}

struct InFlight {
    task: JoinHandle<Result<String, DispatchError>>,
    cancel: CancellationToken,
}

pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    in_flight: Option<InFlight>,
    closed: bool,
    dispatcher: Arc<dyn Dispatch>,
    clock: IdClock,
}

impl Conversation {
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            in_flight: None,
            closed: false,
            dispatcher,
            clock: IdClock::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn phase(&self) -> Phase {
        if self.closed {
            Phase::Closed
        } else if self.in_flight.is_some() {
            Phase::Pending
        } else {
            Phase::Idle
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.phase() == Phase::Pending
    }

    /// Most recent assistant reply that is an image link.
    pub fn latest_image(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Role::Assistant && m.is_image())
    }

    /// Submit whatever is in the pending input.
    pub fn submit_input(&mut self) -> bool {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Append a user message and start dispatching it.
    ///
    /// Returns `false` without touching any state when the text is blank or a
    /// dispatch is already outstanding. Must be called from within a tokio runtime.
    pub fn submit(&mut self, text: &str) -> bool {
        let prompt = text.trim();
        if prompt.is_empty() || self.phase() != Phase::Idle {
            return false;
        }

        let message = Message::new(&mut self.clock, Role::User, prompt);
        info!(
            id = %message.id(),
            route = Route::for_prompt(prompt).as_str(),
            "submitting prompt"
        );
        self.messages.push(message);
        self.input.clear();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let prompt = prompt.to_string();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(DispatchError::Cancelled),
                result = dispatcher.dispatch(&prompt) => result,
            }
        });

        self.in_flight = Some(InFlight { task, cancel });
        true
    }

    /// Settle the outstanding dispatch if it has finished. Never waits.
    ///
    /// Returns `true` when an assistant message was appended.
    pub async fn poll(&mut self) -> bool {
        let finished = self
            .in_flight
            .as_ref()
            .map(|f| f.task.is_finished())
            .unwrap_or(false);

        if !finished {
            return false;
        }

        match self.in_flight.take() {
            Some(in_flight) => {
                self.finish(in_flight).await;
                true
            }
            None => false,
        }
    }

    /// Wait for the outstanding dispatch, if any, and settle it.
    pub async fn wait(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                self.finish(in_flight).await;
                true
            }
            None => false,
        }
    }

    /// Tear down: cancel any outstanding dispatch and refuse further submissions.
    /// A result that arrives afterwards is discarded.
    pub fn close(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("cancelling outstanding dispatch");
            in_flight.cancel.cancel();
        }
        self.closed = true;
    }

    async fn finish(&mut self, in_flight: InFlight) {
        let outcome = match in_flight.task.await {
            Ok(result) => result,
            Err(e) => Err(DispatchError::Aborted(e.to_string())),
        };
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: Result<String, DispatchError>) {
        let content = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "dispatch failed");
                FAILURE_MESSAGE.to_string()
            }
        };

        let message = Message::new(&mut self.clock, Role::Assistant, content);
        info!(id = %message.id(), image = message.is_image(), "reply received");
        self.messages.push(message);
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.cancel.cancel();
        }
    }
}
