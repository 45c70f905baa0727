mod builder;
mod state;

use std::sync::Arc;

use little_chat_model::ModelProviderError;
use tokio::sync::watch;

use crate::conversation::Message;
use crate::model_client::ModelClient;
use crate::retry::RetryPolicy;
pub use builder::ChatSessionBuilder;
pub use state::SessionState;

/// The text shown to the user when a question could not be answered.
///
/// The underlying error is only logged.
pub const FETCH_ERROR_MESSAGE: &str =
    "Error fetching response, please try again later.";

/// What happened to a submitted question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitOutcome {
    /// The text was blank, nothing changed.
    Ignored,
    /// Another question is still waiting for its answer, nothing changed.
    Busy,
    /// The model answered and the answer was added to the conversation.
    Answered,
    /// The model could not answer, the error text is set.
    Failed,
}

type OnChangeFn = Box<dyn Fn(&SessionState) + Send + Sync>;

struct Shared {
    state_tx: watch::Sender<SessionState>,
    model_client: ModelClient,
    retry_policy: RetryPolicy,
    on_change: Option<OnChangeFn>,
}

/// A chat session, which owns the conversation, the input text, the
/// loading flag and the error text.
///
/// Every change of the state is published as a whole new snapshot, which
/// can be observed with [`ChatSession::subscribe`] or with the callback
/// set by [`ChatSessionBuilder::on_change`]. Rendering is expected to be a
/// pure function of the latest snapshot.
///
/// Cloning a session is cheap, and the clones share the same state.
#[derive(Clone)]
pub struct ChatSession {
    shared: Arc<Shared>,
}

impl ChatSession {
    fn from_builder(builder: ChatSessionBuilder) -> Self {
        let ChatSessionBuilder {
            model_client,
            retry_policy,
            on_change,
        } = builder;

        let (state_tx, _) = watch::channel(SessionState::default());
        Self {
            shared: Arc::new(Shared {
                state_tx,
                model_client,
                retry_policy,
                on_change,
            }),
        }
    }

    /// Returns a snapshot of the current state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.shared.state_tx.borrow().clone()
    }

    /// Subscribes to state changes.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Returns `true` if [`ChatSession::submit_input`] would do anything.
    #[inline]
    pub fn can_submit(&self) -> bool {
        self.shared.state_tx.borrow().can_submit()
    }

    /// Replaces the input text.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| {
            if state.input == text {
                return false;
            }
            state.input = text;
            true
        });
    }

    /// Submits the current input text.
    ///
    /// See [`ChatSession::submit`].
    pub async fn submit_input(&self) -> SubmitOutcome {
        let input = self.shared.state_tx.borrow().input.clone();
        self.submit(input).await
    }

    /// Asks the model to answer `text`.
    ///
    /// Blank text is ignored, and so is any text while another question is
    /// in flight. Otherwise the question is added to the conversation and
    /// the input is cleared before the model is called, so the question
    /// stays in the conversation no matter how the call ends. Rate-limited
    /// calls are retried according to the session's [`RetryPolicy`].
    ///
    /// # Cancel safety
    ///
    /// Dropping the future while waiting for the answer clears the loading
    /// flag. The question stays in the conversation, and no answer or error
    /// is added.
    pub async fn submit(&self, text: impl Into<String>) -> SubmitOutcome {
        let text = text.into();
        if text.trim().is_empty() {
            trace!("ignoring blank input");
            return SubmitOutcome::Ignored;
        }

        let mut busy = false;
        self.update(|state| {
            if state.is_loading {
                busy = true;
                return false;
            }
            state.last_error.clear();
            state.is_loading = true;
            state.conversation.push(Message::user(text.clone()));
            state.input.clear();
            true
        });
        if busy {
            debug!("a question is already in flight");
            return SubmitOutcome::Busy;
        }

        let mut loading = LoadingGuard {
            session: self,
            armed: true,
        };

        let model_client = &self.shared.model_client;
        let result = self
            .shared
            .retry_policy
            .run(|| model_client.answer(&text))
            .await;

        loading.armed = false;
        let outcome = match &result {
            Ok(_) => SubmitOutcome::Answered,
            Err(err) => {
                error!(kind = ?err.kind(), "fetch error: {err}");
                SubmitOutcome::Failed
            }
        };
        self.update(move |state| {
            match result {
                Ok(answer) => state.conversation.push(Message::bot(answer)),
                Err(_) => state.last_error = FETCH_ERROR_MESSAGE.to_owned(),
            }
            state.is_loading = false;
            true
        });
        outcome
    }

    /// Applies `f` to the state, and notifies observers if it returns
    /// `true`.
    fn update(&self, f: impl FnOnce(&mut SessionState) -> bool) {
        let changed = self.shared.state_tx.send_if_modified(f);
        if !changed {
            return;
        }
        if let Some(on_change) = &self.shared.on_change {
            // Call with a snapshot, so the callback is free to use the
            // session again.
            let snapshot = self.state();
            on_change(&snapshot);
        }
    }
}

struct LoadingGuard<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("question dropped before it was answered");
        self.session.update(|state| {
            let was_loading = state.is_loading;
            state.is_loading = false;
            was_loading
        });
    }
}
