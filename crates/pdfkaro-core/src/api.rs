//! The processing API as seen by a tool page
//!
//! The actual HTTP client lives in `pdfkaro-client`; this module holds the
//! seam it implements and the interpretation of what comes back.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PdfKaroError;
use crate::request::ApiRequest;

/// Raw response from the processing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send one request. Only transport-level failures are errors here; a
    /// non-2xx status is still an `Ok` response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PdfKaroError>;
}

/// The binary result of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Name suggested by the server, if it sent one
    pub suggested_name: Option<String>,
}

impl JobOutput {
    pub fn is_zip(&self) -> bool {
        self.content_type == "application/zip" || self.bytes.starts_with(b"PK\x03\x04")
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Turn a raw response into a job output or a server error
pub fn interpret_response(response: ApiResponse) -> Result<JobOutput, PdfKaroError> {
    if !response.is_success() {
        return Err(PdfKaroError::Server {
            status: response.status,
            message: error_message(&response.body),
        });
    }

    let suggested_name = response
        .content_disposition
        .as_deref()
        .and_then(disposition_filename);

    Ok(JobOutput {
        content_type: response
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        bytes: response.body,
        suggested_name,
    })
}

/// Best-effort message from an error body: a JSON `detail`, else the text
fn error_message(body: &[u8]) -> String {
    if let Ok(ErrorBody { detail }) = serde_json::from_slice::<ErrorBody>(body) {
        return match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        "no details".to_string()
    } else {
        text
    }
}

/// Extract `filename` from a `Content-Disposition` header value
pub fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = value.trim().trim_matches('"');
        // Never let the server pick a directory
        let name = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
        (!matches!(name, "" | "." | "..")).then(|| name.to_string())
    })
}
