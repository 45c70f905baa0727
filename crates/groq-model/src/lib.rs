//! A model provider for Groq's OpenAI-compatible chat completions API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use little_chat_model::{ErrorKind, ModelProvider, ModelProviderError};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{GroqConfig, GroqConfigBuilder};
use proto::{ChatCompletion, ErrorBody};

/// Error type for [`GroqProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    /// Creates an error for a non-success response. Only `429 Too Many
    /// Requests` is considered a rate limit.
    fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = if status == StatusCode::TOO_MANY_REQUESTS {
            ErrorKind::RateLimitExceeded
        } else {
            ErrorKind::Other
        };
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(body) => format!("{status}: {}", body.error.message),
            Err(_) => format!("{status}"),
        };
        Self {
            message,
            kind,
            status: Some(status.as_u16()),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }
}

/// Groq model provider.
#[derive(Clone, Debug)]
pub struct GroqProvider {
    client: Client,
    config: Arc<GroqConfig>,
}

impl GroqProvider {
    /// Creates a new `GroqProvider` with the given configuration.
    #[inline]
    pub fn new(config: GroqConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Creates a new `GroqProvider` that sends requests with `client`,
    /// e.g. one with custom timeouts or proxy settings.
    #[inline]
    pub fn with_client(config: GroqConfig, client: Client) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GroqProvider {
    type Error = Error;

    fn answer(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let groq_req = proto::create_request(prompt, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::ACCEPT, "application/json")
            .json(&groq_req)
            .send();

        async move {
            let resp = resp_fut
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = Error::from_status(status, &body);
                debug!(status = status.as_u16(), "request failed: {err}");
                return Err(err);
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype() == mime::JSON)
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let completion: ChatCompletion = resp
                .json()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            proto::into_answer(completion).ok_or_else(|| {
                Error::new("No choices in the response", ErrorKind::Other)
            })
        }
    }
}
