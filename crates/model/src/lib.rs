//! An abstraction layer for the language models behind the chat.
//!
//! The chat only needs one thing from a model: give it a prompt and get a
//! completion back, or an error that says whether asking again later may
//! help. This crate pins that contract down so the session logic never
//! depends on a concrete vendor.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;

pub use error::*;
pub use provider::*;
