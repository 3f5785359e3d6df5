use thiserror::Error;

/// Errors raised by the translation engine and the DeepL client.
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered with a non-success status
    #[error("DeepL API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// HTTP 456: the account's character quota is used up
    #[error("DeepL quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("request to DeepL failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected DeepL response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema or flexform data structure could not be resolved
    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid language code: '{0}'")]
    InvalidLanguage(String),
}

impl Error {
    /// Transient failures worth one more attempt at the transport layer:
    /// network errors, rate limiting (429) and server errors (5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
