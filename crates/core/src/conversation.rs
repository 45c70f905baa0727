//! Conversation-related types.

use std::slice;

use serde::{Deserialize, Serialize};

/// Who authored a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing into the chat.
    User,
    /// The model answering.
    Bot,
}

/// One turn in the conversation.
///
/// Messages are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    role: Role,
    text: String,
}

impl Message {
    #[inline]
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    #[inline]
    pub(crate) fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Represents a conversation.
///
/// Messages are kept in insertion order, and the conversation only ever
/// grows: nothing outside this crate can append, and nothing can edit or
/// remove a message.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    #[inline]
    pub(crate) fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    /// Returns all messages, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns an iterator over the messages, oldest first.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = slice::Iter<'a, Message>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut conversation = Conversation::default();
        assert!(conversation.is_empty());

        conversation.push(Message::user("Hello"));
        conversation.push(Message::bot("Hi there"));

        assert_eq!(conversation.len(), 2);
        let roles: Vec<_> = conversation.iter().map(Message::role).collect();
        assert_eq!(roles, [Role::User, Role::Bot]);
        assert_eq!(conversation.last().map(Message::text), Some("Hi there"));
    }

    #[test]
    fn test_serialize() {
        let mut conversation = Conversation::default();
        conversation.push(Message::user("Hello"));
        conversation.push(Message::bot("Hi there"));

        assert_eq!(
            serde_json::to_value(&conversation).unwrap(),
            json!([
                { "type": "user", "text": "Hello" },
                { "type": "bot", "text": "Hi there" },
            ])
        );
    }
}
