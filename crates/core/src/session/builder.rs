use little_chat_model::ModelProvider;

use super::{ChatSession, OnChangeFn, SessionState};
use crate::model_client::ModelClient;
use crate::retry::RetryPolicy;

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    pub(super) model_client: ModelClient,
    pub(super) retry_policy: RetryPolicy,
    pub(super) on_change: Option<OnChangeFn>,
}

impl ChatSessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            retry_policy: RetryPolicy::default(),
            on_change: None,
        }
    }

    /// Sets how rate-limited calls are retried.
    ///
    /// Defaults to [`RetryPolicy::default`].
    #[inline]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Attaches a callback to be invoked after every state change.
    #[inline]
    pub fn on_change(
        mut self,
        on_change: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    /// Builds the session.
    #[inline]
    pub fn build(self) -> ChatSession {
        ChatSession::from_builder(self)
    }
}
