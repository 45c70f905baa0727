//! Core logic of the chat: the session controller, the conversation it
//! owns, and the retry policy wrapped around every model call.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod model_client;
pub mod retry;
mod session;

pub use model_client::ModelError;
pub use retry::RetryPolicy;
pub use session::{
    ChatSession, ChatSessionBuilder, FETCH_ERROR_MESSAGE, SessionState,
    SubmitOutcome,
};
