//! Gemini `generateContent` backend for task prioritization.
//!
//! # Responsibility
//! - Send one structured-output request per prioritization call.
//! - Map HTTP and payload failures onto `PrioritizeError`.
//!
//! # Invariants
//! - Exactly one HTTP attempt per call; no retry.
//! - The API key is sent as a header and never logged.

use super::prioritize::{
    output_schema, parse_priorities, render_prompt, PrioritizeError, PrioritizeRequest,
    TaskPriority, TaskPrioritizer,
};
use log::{error, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the Gemini backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

pub struct GeminiPrioritizer {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiPrioritizer {
    /// Builds a blocking HTTP client for the configured model.
    ///
    /// # Errors
    /// - `MissingApiKey` when no non-blank key is configured.
    /// - `Http` when the client cannot be constructed.
    pub fn new(config: &GeminiConfig) -> Result<Self, PrioritizeError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(PrioritizeError::MissingApiKey)?
            .to_string();

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: generate_content_url(&config.base_url, &config.model),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TaskPrioritizer for GeminiPrioritizer {
    fn prioritize(&self, request: &PrioritizeRequest) -> Result<Vec<TaskPriority>, PrioritizeError> {
        let started_at = Instant::now();
        info!(
            "event=ai_prioritize module=ai status=start model={} task_count={}",
            self.model,
            request.tasks.len()
        );

        let result = self.send(request);
        match &result {
            Ok(priorities) => info!(
                "event=ai_prioritize module=ai status=ok model={} duration_ms={} result_count={}",
                self.model,
                started_at.elapsed().as_millis(),
                priorities.len()
            ),
            Err(err) => error!(
                "event=ai_prioritize module=ai status=error model={} duration_ms={} error_code={} error={}",
                self.model,
                started_at.elapsed().as_millis(),
                error_code(err),
                err
            ),
        }
        result
    }
}

impl GeminiPrioritizer {
    fn send(&self, request: &PrioritizeRequest) -> Result<Vec<TaskPriority>, PrioritizeError> {
        let body = build_request_body(request);
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(PrioritizeError::Status {
                code: status.as_u16(),
                message: error_message(&text),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|err| PrioritizeError::InvalidResponse(err.to_string()))?;
        let output = parsed.first_candidate_text().ok_or(PrioritizeError::EmptyResponse)?;
        parse_priorities(&output)
    }
}

fn generate_content_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model.trim()
    )
}

fn error_code(err: &PrioritizeError) -> &'static str {
    match err {
        PrioritizeError::MissingApiKey => "missing_api_key",
        PrioritizeError::Http(_) => "http_failed",
        PrioritizeError::Status { .. } => "bad_status",
        PrioritizeError::EmptyResponse => "empty_response",
        PrioritizeError::InvalidResponse(_) => "invalid_response",
    }
}

// Wire types for generateContent.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    fn first_candidate_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub(crate) fn build_request_body(request: &PrioritizeRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![TextPart {
                text: render_prompt(request),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: output_schema(),
        },
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        build_request_body, error_message, generate_content_url, GeminiConfig, GeminiPrioritizer,
        GenerateContentResponse,
    };
    use crate::ai::prioritize::{PrioritizeError, PrioritizeRequest};

    #[test]
    fn url_joins_base_and_model() {
        assert_eq!(
            generate_content_url("https://example.test/", "gemini-x"),
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn new_requires_api_key() {
        let config = GeminiConfig {
            api_key: Some("   ".to_string()),
            ..GeminiConfig::default()
        };
        assert!(matches!(
            GeminiPrioritizer::new(&config),
            Err(PrioritizeError::MissingApiKey)
        ));
    }

    #[test]
    fn request_body_asks_for_json_array() {
        let request = PrioritizeRequest {
            tasks: Vec::new(),
            user_habits: "early riser".to_string(),
        };
        let json = serde_json::to_value(build_request_body(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert!(json["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("User Habits: early riser"));
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn candidate_text_concatenates_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"id\":"},{"text":"\"a\"}]"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.first_candidate_text().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.first_candidate_text(), None);
    }

    #[test]
    fn error_message_prefers_structured_body() {
        assert_eq!(
            error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }
}
