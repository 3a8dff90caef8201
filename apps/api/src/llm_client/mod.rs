//! LLM client: the single point of entry for all generative-model calls in SkillPath.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All model interactions go through the `TextModel` trait defined here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod memo;
pub mod prompts;

pub use memo::MemoizedModel;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that turns a prompt into raw model text.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Drops the request URL so error text never carries endpoint details.
fn transport_error(err: reqwest::Error) -> LlmError {
    LlmError::Http(err.without_url())
}

/// Gemini `generateContent` client. One request per call, no retries.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Makes a raw call to the model, returning the decoded response object.
    pub async fn call(&self, prompt: &str) -> Result<GenerateResponse, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {status}");
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        let decoded: GenerateResponse = serde_json::from_str(&body)?;
        debug!(
            "LLM call succeeded: prompt_chars={}, response_chars={}",
            prompt.len(),
            decoded.text().map(str::len).unwrap_or(0)
        );
        Ok(decoded)
    }
}

#[async_trait]
impl TextModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        let text = response.text().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted model: answers each prompt with the first rule whose key is a
    /// substring of the prompt. Records every prompt it sees.
    #[derive(Default)]
    pub struct ScriptedModel {
        rules: Vec<(String, Result<String, u16>)>,
        pub calls: Mutex<VecDeque<String>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, key: &str, response: &str) -> Self {
            self.rules.push((key.to_string(), Ok(response.to_string())));
            self
        }

        pub fn fail_on(mut self, key: &str, status: u16) -> Self {
            self.rules.push((key.to_string(), Err(status)));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push_back(prompt.to_string());
            for (key, outcome) in &self.rules {
                if prompt.contains(key.as_str()) {
                    return match outcome {
                        Ok(text) => Ok(text.clone()),
                        Err(status) => Err(LlmError::Api {
                            status: *status,
                            message: "scripted failure".to_string(),
                        }),
                    };
                }
            }
            Err(LlmError::EmptyContent)
        }
    }
}
