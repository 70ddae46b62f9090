//! Roadmap generation: POST the questionnaire text, read back the result.
//!
//! The service is the only stage whose failure ends the request. There are no
//! retries: one failed attempt is reported and nothing is rendered.

use crate::config::AssessmentConfig;
use crate::error::{AssessError, RoadmapError};
use crate::pipeline::normalize::ExtractedText;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Structured answer of the roadmap service.
///
/// Every field defaults to empty. Missing keys and `null` values are not
/// errors, and scalar values of another JSON type are kept as their JSON
/// text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapResult {
    /// Questionnaire answers, separated by a bullet glyph.
    #[serde(deserialize_with = "lenient_string")]
    pub questionnaire: String,
    /// Eligible job roles (Markdown).
    #[serde(deserialize_with = "lenient_string")]
    pub job_roles: String,
    /// NOC codes with their titles, in service order.
    #[serde(deserialize_with = "lenient_strings")]
    pub noc_codes: Vec<String>,
    /// CRS score breakdown (Markdown).
    #[serde(deserialize_with = "lenient_string")]
    pub crs_score: String,
    /// Step-by-step immigration roadmap (Markdown).
    #[serde(deserialize_with = "lenient_string")]
    pub roadmap: String,
}

fn value_to_string(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        single => vec![value_to_string(single)],
    })
}

#[derive(Debug, Serialize)]
struct RoadmapRequest<'a> {
    questionnaire: &'a str,
}

/// Client for the roadmap-generation endpoint.
#[derive(Debug, Clone)]
pub struct RoadmapClient {
    http: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl RoadmapClient {
    /// Build a client with the configured endpoint and timeout.
    pub fn new(config: &AssessmentConfig) -> Result<Self, AssessError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.roadmap_timeout_secs))
            .build()
            .map_err(|e| AssessError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            url: config.roadmap_url.clone(),
            timeout_secs: config.roadmap_timeout_secs,
        })
    }

    /// Send `{"questionnaire": text}` and map the response.
    ///
    /// | Response            | Result                            |
    /// |---------------------|-----------------------------------|
    /// | 200 + JSON object   | `Ok(RoadmapResult)`               |
    /// | 200 + other body    | `Err(InvalidResponse)`            |
    /// | 404                 | `Err(NotFound)`                   |
    /// | other status        | `Err(Status { status })`          |
    /// | timeout / transport | `Err(Timeout)` / `Err(Transport)` |
    pub async fn generate(&self, text: &ExtractedText) -> Result<RoadmapResult, RoadmapError> {
        let payload = RoadmapRequest {
            questionnaire: text.as_str(),
        };
        debug!(
            "Roadmap: posting {} characters to {}",
            text.char_count(),
            self.url
        );

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(RoadmapError::NotFound),
            other => {
                return Err(RoadmapError::Status {
                    status: other.as_u16(),
                })
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        let result: RoadmapResult =
            serde_json::from_str(&body).map_err(|e| RoadmapError::InvalidResponse {
                detail: e.to_string(),
            })?;

        info!(
            "Roadmap received: {} NOC codes, {} roadmap characters",
            result.noc_codes.len(),
            result.roadmap.chars().count()
        );
        Ok(result)
    }

    fn transport_error(&self, e: reqwest::Error) -> RoadmapError {
        if e.is_timeout() {
            RoadmapError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RoadmapError::Transport {
                detail: e.to_string(),
            }
        }
    }
}
