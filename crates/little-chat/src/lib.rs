//! An out-of-the-box chat that puts a Groq-hosted model behind a session.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library: [`config`] reads the settings from the environment,
//! and [`view`] turns session state into rows a terminal can draw.

#![deny(missing_docs)]

pub mod config;
pub mod view;

pub use config::Config;

/// Re-exports of [`little_chat_core`] crate.
pub mod core {
    pub use little_chat_core::*;
}

/// Re-exports of [`little_chat_model`] crate.
pub mod model {
    pub use little_chat_model::*;
}

/// Re-exports of [`little_chat_groq_model`] crate.
pub mod groq {
    pub use little_chat_groq_model::*;
}
