use serde::{Deserialize, Serialize};

use crate::GroqConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct AssistantMessage {
    pub content: Option<String>,
}

/// The body of a failed request, e.g. `{"error": {"message": "..."}}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User { content: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

// -----------
// Conversions
// -----------

/// Every prompt is sent on its own, without earlier turns.
#[inline]
pub fn create_request(
    prompt: &str,
    config: &GroqConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![Message::User {
            content: prompt.to_owned(),
        }],
        stream: false,
    }
}

/// Picks the answer from the first choice. A choice without content is
/// an empty answer.
#[inline]
pub fn into_answer(completion: ChatCompletion) -> Option<String> {
    let choice = completion.choices.into_iter().next()?;
    trace!(finish_reason = ?choice.finish_reason, "picked first choice");
    Some(choice.message.content.unwrap_or_default())
}
