use crate::conversation::Conversation;

/// A snapshot of everything a chat window shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(super) conversation: Conversation,
    pub(super) input: String,
    pub(super) is_loading: bool,
    pub(super) last_error: String,
}

impl SessionState {
    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the text in the input box.
    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns `true` while a question is waiting for its answer.
    #[inline]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Returns the error text, which is empty when there is no error.
    #[inline]
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Returns the error text, if there is any.
    #[inline]
    pub fn error(&self) -> Option<&str> {
        (!self.last_error.is_empty()).then_some(self.last_error.as_str())
    }

    /// Returns `true` if the input can be submitted, that is, it is not
    /// blank and no question is in flight.
    #[inline]
    pub fn can_submit(&self) -> bool {
        !self.is_loading && !self.input.trim().is_empty()
    }
}
