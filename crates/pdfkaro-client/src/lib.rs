//! HTTP transport for the PDFkaro.in processing API
//!
//! Implements [`ApiTransport`] over reqwest. Multipart bodies are sent as
//! `multipart/form-data` with each PDF part labelled `application/pdf`; JSON
//! bodies go out as `application/json`. A non-2xx status is returned as a
//! response, not an error, so the tool page can surface the server's message.

mod error;

use std::time::Duration;

use async_trait::async_trait;
use pdfkaro_core::{ApiRequest, ApiResponse, ApiTransport, FormPart, PdfKaroError, RequestBody};
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use tracing::{debug, info, warn};

pub use error::ClientError;

/// Where the hosted API lives unless told otherwise
pub const DEFAULT_API_URL: &str = "https://pdfkaro-fastapi.onrender.com";

/// Environment variable overriding [`DEFAULT_API_URL`]
pub const API_URL_ENV: &str = "PDFKARO_API_URL";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Default config with the base URL taken from `PDFKARO_API_URL` if set
    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`ApiTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        info!(base_url = %base_url, timeout_secs = config.timeout.as_secs(), "API client ready");
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/api/v1/merge`
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = self.endpoint_url(request.endpoint)?;
        debug!(url = %url, "POST");

        let builder = self.http.post(url);
        let builder = match request.body {
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
            RequestBody::Json(payload) => builder.json(&payload),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let body = response.bytes().await?.to_vec();

        debug!(status, size = body.len(), "response received");
        Ok(ApiResponse {
            status,
            content_type,
            content_disposition,
            body,
        })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, PdfKaroError> {
        let endpoint = request.endpoint;
        self.execute(request).await.map_err(|e| {
            warn!(endpoint, error = %e, "request failed");
            PdfKaroError::from(e)
        })
    }
}

/// Base URLs are treated as directories so `join` keeps any path prefix
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::File {
                field,
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(mime)
                    .map_err(|source| ClientError::InvalidPart { field, source })?;
                form.part(field, part)
            }
            FormPart::Text { field, value } => form.text(field, value),
        };
    }
    Ok(form)
}
