/*
[INPUT]:  Error sources (validation, HTTP, API envelope, rate admission)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

use crate::rate::EndpointCategory;

/// Main error type for the Bittrex adapter
#[derive(Error, Debug)]
pub enum BittrexError {
    /// Local validation failed; no network call was made
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No response within the per-call deadline. When `effect_uncertain`
    /// is set the operation may still have taken effect on the exchange.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64,
        effect_uncertain: bool,
    },

    /// Admission was refused: the governor rejected the call outright or
    /// the required delay exceeded the configured budget
    #[error("rate limited ({category}): {message}")]
    RateLimited {
        category: EndpointCategory,
        message: String,
    },

    /// The exchange reported a failure. `code` carries the HTTP status
    /// when the failure surfaced below the API envelope.
    #[error("exchange error: {message}")]
    Exchange { code: Option<u16>, message: String },

    /// The payload matched no known shape
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    /// URL parsing failed
    #[error("invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Missing or unusable configuration (e.g. absent credentials)
    #[error("configuration error: {message}")]
    Config { message: String },

    /// WebSocket stream failure
    #[error("stream error: {message}")]
    Stream { message: String },
}

impl BittrexError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        BittrexError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        BittrexError::MalformedResponse {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        BittrexError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn stream(message: impl Into<String>) -> Self {
        BittrexError::Stream {
            message: message.into(),
        }
    }

    /// Whether a caller-directed retry with backoff is reasonable.
    ///
    /// Transport failures and certain-effect timeouts are retryable.
    /// Validation and malformed-response failures never are, and an
    /// uncertain-effect timeout must be reconciled, not replayed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BittrexError::Transport(_) => true,
            BittrexError::Timeout {
                effect_uncertain, ..
            } => !effect_uncertain,
            _ => false,
        }
    }

    /// True when the call may have taken effect despite the failure.
    pub fn effect_uncertain(&self) -> bool {
        matches!(
            self,
            BittrexError::Timeout {
                effect_uncertain: true,
                ..
            }
        )
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, BittrexError>;
