use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use super::types::{LlmClient, ModelRequest, ModelResponse};
use super::AnalysisError;
use crate::config::ModelSettings;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Blocking HTTP client for the hosted language model.
pub struct HttpModelClient {
    invoke_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    settings: ModelSettings,
}

impl HttpModelClient {
    pub fn new(settings: &ModelSettings) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::HttpClient(e.to_string()))?;

        Ok(Self {
            invoke_url: invoke_url(&settings.endpoint, &settings.model_id),
            api_key: settings.api_key.clone(),
            client,
            settings: settings.clone(),
        })
    }

    pub fn invoke_url(&self) -> &str {
        &self.invoke_url
    }
}

/// `{endpoint}/model/{model_id}/invoke`
fn invoke_url(endpoint: &str, model_id: &str) -> String {
    format!("{}/model/{}/invoke", endpoint.trim_end_matches('/'), model_id)
}

/// Request body for the messages invoke API
#[derive(Serialize)]
struct InvokeRequest<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    system: &'a str,
    messages: [InvokeMessage<'a>; 1],
}

#[derive(Serialize)]
struct InvokeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl LlmClient for HttpModelClient {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, AnalysisError> {
        let body = InvokeRequest {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            system: request.system.trim(),
            messages: [InvokeMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        let mut builder = self
            .client
            .post(&self.invoke_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().map_err(|e| {
            if e.is_connect() {
                AnalysisError::Connection(self.invoke_url.clone())
            } else if e.is_timeout() {
                AnalysisError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.settings.timeout_secs
                ))
            } else {
                AnalysisError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| AnalysisError::HttpClient(e.to_string()))?;

        if !status.is_success() {
            return Err(AnalysisError::ServiceStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        ModelResponse::from_body(&text)
    }
}

/// Mock LLM client for testing. Returns a configurable raw body.
pub struct MockLlmClient {
    body: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlmClient {
    /// Respond with a messages-shaped body whose single text segment is `text`.
    pub fn new(text: &str) -> Self {
        let body = serde_json::json!({
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
        });
        Self::with_body(&body.to_string())
    }

    /// Respond with an arbitrary raw body.
    pub fn with_body(body: &str) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Fail every call with a 503 service error.
    pub fn unavailable(message: &str) -> Self {
        Self {
            body: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_prompt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.prompt.to_string());

        match &self.body {
            Ok(body) => ModelResponse::from_body(body),
            Err(message) => Err(AnalysisError::ServiceStatus {
                status: 503,
                body: message.clone(),
            }),
        }
    }
}
