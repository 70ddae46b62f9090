//! Remote OCR: upload the PDF, read back a `text` field.
//!
//! The service is a RapidAPI endpoint. It takes the document as multipart
//! field `pdf` and authenticates through the `X-RapidAPI-Key` and
//! `X-RapidAPI-Host` headers. Every failure is returned as an [`OcrError`];
//! deciding what to do about it is the caller's job (see
//! [`crate::pipeline::extract`]).

use crate::config::AssessmentConfig;
use crate::error::{AssessError, OcrError};
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::normalize::{normalize, ExtractedText};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Response body of the OCR endpoint. Only `text` is used.
#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the remote OCR endpoint.
///
/// Not `Debug`: it holds the API key.
#[derive(Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    url: String,
    host: String,
    api_key: String,
    timeout_secs: u64,
}

impl OcrClient {
    /// Build a client with the configured endpoint, credentials and timeout.
    pub fn new(config: &AssessmentConfig) -> Result<Self, AssessError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ocr_timeout_secs))
            .build()
            .map_err(|e| AssessError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            url: config.ocr_url.clone(),
            host: config.ocr_host.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.ocr_timeout_secs,
        })
    }

    /// Send the document to the OCR service and return its normalised text.
    ///
    /// A 200 response without a `text` field yields empty text, not an error.
    pub async fn extract(&self, document: &UploadedDocument) -> Result<ExtractedText, OcrError> {
        let part = Part::bytes(document.bytes().to_vec())
            .file_name(document.name().to_string())
            .mime_str("application/pdf")
            .map_err(|e| self.transport_error(e))?;
        let form = Form::new().part("pdf", part);

        debug!("OCR: uploading {} bytes to {}", document.len(), self.url);

        let response = self
            .http
            .post(&self.url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OcrError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        let parsed: OcrResponse =
            serde_json::from_str(&body).map_err(|e| OcrError::InvalidResponse {
                detail: e.to_string(),
            })?;

        let text = normalize(parsed.text.as_deref().unwrap_or_default());
        debug!("OCR: {} characters extracted", text.char_count());
        Ok(text)
    }

    fn transport_error(&self, e: reqwest::Error) -> OcrError {
        if e.is_timeout() {
            OcrError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            OcrError::Transport {
                detail: e.to_string(),
            }
        }
    }
}
