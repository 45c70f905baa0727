//! Settings read from the environment.

use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::time::Duration;

use little_chat_core::RetryPolicy;
use little_chat_groq_model::{GroqConfig, GroqConfigBuilder};

/// Environment variable holding the Groq API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "GROQ_MODEL";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "GROQ_BASE_URL";
/// Environment variable capping each backoff wait, in milliseconds.
pub const MAX_BACKOFF_VAR: &str = "LITTLE_CHAT_MAX_BACKOFF_MS";
/// Environment variable with the terminal width.
pub const COLUMNS_VAR: &str = "COLUMNS";

const DEFAULT_COLUMNS: usize = 80;

/// Error returned by [`Config::from_env`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set or empty.
    Missing(&'static str),
    /// A variable is set to something that cannot be parsed.
    Invalid {
        /// Name of the variable.
        name: &'static str,
        /// The offending value.
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::Invalid { name, value } => {
                write!(f, "{name} environment variable is invalid: {value:?}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings of the chat.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    max_backoff: Option<Duration>,
    columns: usize,
}

impl Config {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings with `lookup`, which returns the value of an
    /// environment variable.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Empty values are treated as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key =
            var(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
        let max_backoff = var(MAX_BACKOFF_VAR)
            .map(|value| match value.trim().parse::<u64>() {
                Ok(ms) => Ok(Duration::from_millis(ms)),
                Err(_) => Err(ConfigError::Invalid {
                    name: MAX_BACKOFF_VAR,
                    value,
                }),
            })
            .transpose()?;
        let columns = var(COLUMNS_VAR)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_COLUMNS);

        Ok(Self {
            api_key,
            model: var(MODEL_VAR),
            base_url: var(BASE_URL_VAR),
            max_backoff,
            columns,
        })
    }

    /// Returns the provider configuration.
    pub fn groq_config(&self) -> GroqConfig {
        let mut builder = GroqConfigBuilder::with_api_key(self.api_key.clone());
        if let Some(model) = &self.model {
            builder = builder.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        builder.build()
    }

    /// Returns the retry policy for model calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::default();
        match self.max_backoff {
            Some(max_backoff) => policy.with_max_delay(max_backoff),
            None => policy,
        }
    }

    /// Returns the terminal width to lay out the conversation in.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_backoff", &self.max_backoff)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(
        vars: &'a [(&'a str, &'a str)],
    ) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<_, _> = vars.iter().copied().collect();
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_api_key_is_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(API_KEY_VAR))
        );
        assert_eq!(
            Config::from_lookup(lookup(&[(API_KEY_VAR, "  ")])),
            Err(ConfigError::Missing(API_KEY_VAR))
        );
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[(API_KEY_VAR, "gsk_1")])).unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.columns(), DEFAULT_COLUMNS);
        assert_eq!(
            config.groq_config(),
            GroqConfigBuilder::with_api_key("gsk_1").build()
        );
        assert!(!format!("{config:?}").contains("gsk_1"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "gsk_1"),
            (MODEL_VAR, "mixtral"),
            (BASE_URL_VAR, "http://localhost:1234/v1"),
            (MAX_BACKOFF_VAR, "5000"),
            (COLUMNS_VAR, "120"),
        ]))
        .unwrap();

        let groq_config = config.groq_config();
        assert_eq!(groq_config.model(), "mixtral");
        assert_eq!(groq_config.base_url(), "http://localhost:1234/v1");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::default().with_max_delay(Duration::from_secs(5))
        );
        assert_eq!(config.columns(), 120);
    }

    #[test]
    fn test_invalid_backoff() {
        let err = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "gsk_1"),
            (MAX_BACKOFF_VAR, "soon"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: MAX_BACKOFF_VAR,
                value: "soon".to_owned(),
            }
        );
    }
}
