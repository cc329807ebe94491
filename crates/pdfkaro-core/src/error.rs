use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdfKaroError {
    #[error("Only PDF files are accepted: {0}")]
    RejectedFile(String),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to render page {}: {reason}", .page + 1)]
    RenderError { page: u32, reason: String },

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("{0}")]
    Validation(String),

    #[error("No entry with id {0}")]
    UnknownEntry(u64),

    #[error("Index {index} is out of bounds for {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
}

impl From<serde_json::Error> for PdfKaroError {
    fn from(err: serde_json::Error) -> Self {
        PdfKaroError::SerializationError(err.to_string())
    }
}
