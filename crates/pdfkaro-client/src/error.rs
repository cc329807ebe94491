use pdfkaro_core::PdfKaroError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid form part '{field}': {source}")]
    InvalidPart {
        field: &'static str,
        source: reqwest::Error,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Could not reach the API: {0}")]
    Connect(String),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_connect() {
            ClientError::Connect(err.to_string())
        } else {
            ClientError::Http(err)
        }
    }
}

impl From<ClientError> for PdfKaroError {
    fn from(err: ClientError) -> Self {
        PdfKaroError::Transport(err.to_string())
    }
}
