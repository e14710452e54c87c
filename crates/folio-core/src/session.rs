use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_provider::GenerationBackend;
use folio_schema::{AnswerSource, ConversationMessage, PortfolioProfile};
use serde::{Deserialize, Serialize};

use crate::context::compile_context;
use crate::fallback::fallback_respond;

/// Banner shown while answers come from the fallback responder.
pub const GENERATION_UNAVAILABLE_NOTICE: &str =
    "Unable to connect to AI. Make sure the local generation service is running.";

pub fn default_greeting(owner_name: &str, model: &str) -> String {
    format!(
        "Hi! I'm an AI assistant powered by {model}. I can help you learn about {owner_name}'s skills, projects, research, and experience. What would you like to know?"
    )
}

/// Suggested first questions, offered until the visitor sends anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    Skills,
    Projects,
    Research,
    Contact,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [
        QuickAction::Skills,
        QuickAction::Projects,
        QuickAction::Research,
        QuickAction::Contact,
    ];

    pub fn question(self) -> &'static str {
        match self {
            QuickAction::Skills => "What are your skills?",
            QuickAction::Projects => "Tell me about projects",
            QuickAction::Research => "Show research papers",
            QuickAction::Contact => "Contact information",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QuickAction::Skills => "skills",
            QuickAction::Projects => "projects",
            QuickAction::Research => "research",
            QuickAction::Contact => "contact",
        }
    }

    /// Accepts either the short name or the full question text.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|action| {
            action.name().eq_ignore_ascii_case(label)
                || action.question().eq_ignore_ascii_case(label)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    EmptySubmission,
    ConcurrentSubmission,
    QuickActionsExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SubmitOutcome {
    Ignored {
        reason: IgnoreReason,
    },
    Answered {
        source: AnswerSource,
        message: ConversationMessage,
    },
}

impl SubmitOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, SubmitOutcome::Answered { .. })
    }
}

/// A visitor turn that has been recorded and is waiting for its answer.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub question: String,
}

/// Read-only view of a session for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub messages: Vec<ConversationMessage>,
    pub is_open: bool,
    pub is_awaiting: bool,
    pub last_error: Option<String>,
    pub quick_actions: Vec<QuickAction>,
}

/// State of one chat widget: the transcript plus UI flags. Messages are
/// append-only and ids are assigned as `max + 1`.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    messages: Vec<ConversationMessage>,
    initial_len: usize,
    is_open: bool,
    awaiting: bool,
    last_error: Option<String>,
}

impl ConversationSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        let messages = vec![ConversationMessage::assistant(1, greeting)];
        Self {
            initial_len: messages.len(),
            messages,
            is_open: false,
            awaiting: false,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn quick_actions_offered(&self) -> bool {
        self.messages.len() == self.initial_len
    }

    pub fn quick_actions(&self) -> Vec<QuickAction> {
        if self.quick_actions_offered() {
            QuickAction::ALL.to_vec()
        } else {
            Vec::new()
        }
    }

    /// Records the visitor message and enters the awaiting state.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn, IgnoreReason> {
        if text.trim().is_empty() {
            return Err(IgnoreReason::EmptySubmission);
        }
        if self.awaiting {
            return Err(IgnoreReason::ConcurrentSubmission);
        }
        let id = self.next_id();
        self.messages.push(ConversationMessage::visitor(id, text));
        self.awaiting = true;
        self.last_error = None;
        Ok(PendingTurn {
            question: text.to_string(),
        })
    }

    pub fn begin_quick_action(&mut self, action: QuickAction) -> Result<PendingTurn, IgnoreReason> {
        if self.awaiting {
            return Err(IgnoreReason::ConcurrentSubmission);
        }
        if !self.quick_actions_offered() {
            return Err(IgnoreReason::QuickActionsExpired);
        }
        self.begin_turn(action.question())
    }

    /// Appends the answer for `turn` and returns to idle. `error` is the
    /// banner text to show when the answer came from the fallback.
    pub fn complete_turn(
        &mut self,
        _turn: PendingTurn,
        answer: String,
        error: Option<String>,
    ) -> ConversationMessage {
        let message = ConversationMessage::assistant(self.next_id(), answer);
        self.messages.push(message.clone());
        if error.is_some() {
            self.last_error = error;
        }
        self.awaiting = false;
        message
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.messages.clone(),
            is_open: self.is_open,
            is_awaiting: self.awaiting,
            last_error: self.last_error.clone(),
            quick_actions: self.quick_actions(),
        }
    }

    fn next_id(&self) -> u64 {
        self.messages.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }
}

/// Drives a [`ConversationSession`]: compiles the context, asks the backend and
/// falls back to the keyword responder when generation fails.
///
/// The state lock is never held across the backend call. A second submit that
/// arrives while a request is in flight sees the awaiting flag and is ignored.
///
/// Each turn runs on its own tokio task, so dropping the `submit` future (an
/// aborted HTTP request, a caller-side timeout) does not abandon the turn: the
/// answer is still appended and the session returns to idle.
pub struct ChatWidget {
    profile: Arc<PortfolioProfile>,
    backend: Arc<dyn GenerationBackend>,
    state: Arc<Mutex<ConversationSession>>,
}

impl ChatWidget {
    pub fn new(
        profile: Arc<PortfolioProfile>,
        backend: Arc<dyn GenerationBackend>,
        greeting: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            backend,
            state: Arc::new(Mutex::new(ConversationSession::new(greeting))),
        }
    }

    pub fn with_default_greeting(
        profile: Arc<PortfolioProfile>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        let greeting = default_greeting(&profile.identity.name, backend.model());
        Self::new(profile, backend, greeting)
    }

    pub fn profile(&self) -> &PortfolioProfile {
        &self.profile
    }

    pub fn open(&self) {
        self.state().open();
    }

    pub fn close(&self) {
        self.state().close();
    }

    pub fn toggle(&self) {
        self.state().toggle();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let turn = self.state().begin_turn(text);
        self.resolve(turn).await
    }

    pub async fn submit_quick_action(&self, action: QuickAction) -> SubmitOutcome {
        let turn = self.state().begin_quick_action(action);
        self.resolve(turn).await
    }

    async fn resolve(&self, turn: Result<PendingTurn, IgnoreReason>) -> SubmitOutcome {
        let turn = match turn {
            Ok(turn) => turn,
            Err(reason) => {
                tracing::debug!(?reason, "submission ignored");
                return SubmitOutcome::Ignored { reason };
            }
        };

        let task = tokio::spawn(run_turn(
            self.profile.clone(),
            self.backend.clone(),
            self.state.clone(),
            turn.clone(),
        ));
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("chat turn task failed, using fallback: {err}");
                let message = lock_session(&self.state).complete_turn(
                    turn.clone(),
                    fallback_respond(&turn.question, &self.profile),
                    Some(GENERATION_UNAVAILABLE_NOTICE.to_string()),
                );
                SubmitOutcome::Answered {
                    source: AnswerSource::Fallback,
                    message,
                }
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ConversationSession> {
        lock_session(&self.state)
    }
}

fn lock_session(state: &Mutex<ConversationSession>) -> MutexGuard<'_, ConversationSession> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_turn(
    profile: Arc<PortfolioProfile>,
    backend: Arc<dyn GenerationBackend>,
    state: Arc<Mutex<ConversationSession>>,
    turn: PendingTurn,
) -> SubmitOutcome {
    let context = compile_context(&profile);
    let (answer, source, error) = match backend.generate(&context, &turn.question).await {
        Ok(text) => (text, AnswerSource::Generated, None),
        Err(err) => {
            tracing::warn!(kind = err.kind(), "generation failed, using fallback: {err}");
            (
                fallback_respond(&turn.question, &profile),
                AnswerSource::Fallback,
                Some(GENERATION_UNAVAILABLE_NOTICE.to_string()),
            )
        }
    };

    let message = lock_session(&state).complete_turn(turn, answer, error);
    SubmitOutcome::Answered { source, message }
}
