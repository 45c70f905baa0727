use serde::{Deserialize, Serialize};

/// How a preset answer fails before it succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetFailure {
    /// The provider reports a rate limit (HTTP 429).
    #[default]
    #[serde(rename = "rate_limited")]
    RateLimited,
    /// Any other failure, with a message.
    #[serde(rename = "other")]
    Other(String),
}

/// The preset answer for one prompt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetAnswer {
    /// The completion text.
    pub text: String,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
    /// The failure to report for the failing attempts.
    #[serde(default)]
    pub failure: PresetFailure,
}

impl PresetAnswer {
    /// Creates a `PresetAnswer` that succeeds with `text`.
    #[inline]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failures: None,
            failure: PresetFailure::default(),
        }
    }

    /// Creates a `PresetAnswer` that never succeeds.
    #[inline]
    pub fn always_failing(failure: PresetFailure) -> Self {
        Self::with_text("").with_failures(0).with_failure(failure)
    }

    /// Sets failure times before a successful answer. `0` means the
    /// answer will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Sets what the failing attempts report.
    #[inline]
    pub fn with_failure(mut self, failure: PresetFailure) -> Self {
        self.failure = failure;
        self
    }
}
