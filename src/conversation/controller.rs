//! Conversation controller: the message log and the single in-flight query
//!
//! The controller is the only writer of the log. A query moves through
//! `idle -> pending -> idle`; while pending, further submissions are
//! ignored. The pending flag is reset by a drop guard, so it is cleared on
//! every exit path including cancellation of the submitting future.

use crate::agent::AgentClient;
use crate::conversation::message::{Message, Role};
use crate::error::KbError;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Banner text shown when a query failed in transport
pub const NETWORK_ERROR_BANNER: &str = "Network error occurred";

/// Snapshot of everything a front end renders for a conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    /// Append-only log, oldest first
    pub messages: Vec<Message>,
    /// A query is in flight
    pub pending: bool,
    /// Dismissible banner text for the last failed query
    pub last_error: Option<String>,
    /// Text the user is composing
    pub input: String,
}

/// A key press delivered to the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Return key; with shift it inserts a newline instead of submitting
    Enter { shift: bool },
    Char(char),
    Backspace,
}

/// What a submission did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input or a query already pending; nothing was appended
    Ignored,
    /// The agent answered; carries the appended agent turn
    Answered(Message),
    /// The query failed; carries the appended error turn
    Failed(Message),
}

impl SubmitOutcome {
    /// The agent turn appended by this submission, if any
    pub fn message(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Ignored => None,
            SubmitOutcome::Answered(msg) | SubmitOutcome::Failed(msg) => Some(msg),
        }
    }
}

/// Owns the conversation log and issues queries through an [`AgentClient`]
pub struct ConversationController {
    client: Arc<dyn AgentClient>,
    agent_id: String,
    state: Mutex<ConversationState>,
}

impl std::fmt::Debug for ConversationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationController")
            .field("agent_id", &self.agent_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

struct PendingGuard<'a> {
    controller: &'a ConversationController,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.controller.state().pending = false;
    }
}

impl ConversationController {
    /// Create a controller that asks `agent_id` through `client`
    pub fn new(client: Arc<dyn AgentClient>, agent_id: impl Into<String>) -> Self {
        Self {
            client,
            agent_id: agent_id.into(),
            state: Mutex::new(ConversationState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Submit the current input buffer
    pub async fn submit(&self) -> SubmitOutcome {
        let text = self.state().input.clone();
        self.submit_text(&text).await
    }

    /// Submit `text` as the next query
    ///
    /// Blank text, or a submission while another query is pending, is a
    /// no-op: nothing is appended and no request is made. Otherwise the
    /// user turn is appended and the input buffer cleared before the
    /// request starts; the agent turn is appended when it completes.
    pub async fn submit_text(&self, text: &str) -> SubmitOutcome {
        {
            let mut state = self.state();
            if state.pending || text.trim().is_empty() {
                tracing::debug!(pending = state.pending, "Ignoring submission");
                return SubmitOutcome::Ignored;
            }
            state.messages.push(Message::user(text));
            state.input.clear();
            state.pending = true;
            state.last_error = None;
        }
        let _pending = PendingGuard { controller: self };

        tracing::info!(agent_id = %self.agent_id, "Submitting query");
        let result = self.client.query(text, &self.agent_id).await;

        let mut state = self.state();
        match result {
            Ok(answer) => {
                let msg = Message::agent(answer);
                tracing::debug!(
                    sources = msg.sources.len(),
                    follow_ups = msg.follow_ups.len(),
                    "Agent answered"
                );
                state.messages.push(msg.clone());
                SubmitOutcome::Answered(msg)
            }
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                let banner = match &e {
                    KbError::Transport(_) => NETWORK_ERROR_BANNER.to_string(),
                    other => other.user_message(),
                };
                let msg = Message::agent_error(e.user_message());
                state.last_error = Some(banner);
                state.messages.push(msg.clone());
                SubmitOutcome::Failed(msg)
            }
        }
    }

    /// Resubmit the most recent query if its answer was an error turn
    ///
    /// The failed turns stay in the log; the retry appends new ones.
    pub async fn retry_last(&self) -> SubmitOutcome {
        let query = {
            let state = self.state();
            match state.messages.last() {
                Some(last) if last.role == Role::Agent && last.is_error => state
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.is_user())
                    .map(|m| m.content.clone()),
                _ => None,
            }
        };
        match query {
            Some(text) => self.submit_text(&text).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// Apply a key press to the input buffer, submitting on plain Enter
    pub async fn handle_key(&self, key: KeyInput) -> SubmitOutcome {
        match key {
            KeyInput::Enter { shift: false } => self.submit().await,
            KeyInput::Enter { shift: true } => {
                self.state().input.push('\n');
                SubmitOutcome::Ignored
            }
            KeyInput::Char(c) => {
                self.state().input.push(c);
                SubmitOutcome::Ignored
            }
            KeyInput::Backspace => {
                self.state().input.pop();
                SubmitOutcome::Ignored
            }
        }
    }

    /// Replace the input buffer
    pub fn set_input(&self, text: impl Into<String>) {
        self.state().input = text.into();
    }

    pub fn input(&self) -> String {
        self.state().input.clone()
    }

    /// Clear the failure banner; the log is untouched
    pub fn dismiss_error(&self) {
        self.state().last_error = None;
    }

    pub fn is_pending(&self) -> bool {
        self.state().pending
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// Full state snapshot
    pub fn snapshot(&self) -> ConversationState {
        self.state().clone()
    }
}
