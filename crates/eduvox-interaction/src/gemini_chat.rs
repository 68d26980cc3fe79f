//! GeminiChatBackend - Direct REST API implementation for Gemini chat.
//!
//! This backend calls the Gemini REST API directly without CLI dependency.
//! The API key is resolved from the environment or secret.json.

use async_trait::async_trait;
use eduvox_core::backend::{Conversation, ConversationBackend};
use eduvox_core::config::ChatConfig;
use eduvox_core::error::Result;
use eduvox_core::EduvoxError;
use eduvox_infrastructure::{resolve_gemini_key, SecretServiceImpl};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend that opens multi-turn conversations against the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiChatBackend {
    client: Client,
    api_key: String,
    model: String,
    generation: GenerationConfig,
}

impl GeminiChatBackend {
    /// Creates a new backend with the provided API key and chat settings.
    pub fn new(api_key: impl Into<String>, chat: &ChatConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: chat.model_name.clone(),
            generation: GenerationConfig::from_chat(chat),
        }
    }

    /// Resolves the API key from `GEMINI_API_KEY` or secret.json.
    ///
    /// The environment variable takes precedence over the secret file.
    /// A missing key is a configuration error reported before any request
    /// is attempted.
    pub async fn try_from_env(chat: &ChatConfig) -> Result<Self> {
        let service = SecretServiceImpl::default_location().map_err(|e| {
            EduvoxError::config(format!("Failed to initialize SecretService: {}", e))
        })?;

        let secrets = eduvox_core::secret::SecretService::load_secrets(&service)
            .await
            .map_err(|e| EduvoxError::config(format!("Failed to load secret.json: {}", e)))?;

        let api_key = resolve_gemini_key(std::env::var("GEMINI_API_KEY").ok(), &secrets)
            .ok_or_else(|| {
                EduvoxError::config(
                    "Gemini API key not found. Set GEMINI_API_KEY or fill in secret.json",
                )
            })?;

        Ok(Self::new(api_key, chat))
    }
}

impl ConversationBackend for GeminiChatBackend {
    fn start_conversation(&self, system_instruction: &str) -> Result<Box<dyn Conversation>> {
        tracing::debug!(
            "[GeminiChatBackend] Starting conversation with model {}",
            self.model
        );
        Ok(Box::new(GeminiConversation {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            generation: self.generation.clone(),
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            }),
            history: Vec::new(),
        }))
    }
}

/// One live Gemini conversation carrying its own role/parts history.
struct GeminiConversation {
    client: Client,
    api_key: String,
    model: String,
    generation: GenerationConfig,
    system_instruction: Option<Content>,
    history: Vec<Content>,
}

impl GeminiConversation {
    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                EduvoxError::backend(
                    None,
                    format!("Gemini API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            EduvoxError::backend(None, format!("Failed to parse Gemini response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn send_message(&mut self, text: &str) -> Result<String> {
        let user_message = Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        };

        let request = build_request(
            &self.history,
            user_message.clone(),
            self.system_instruction.clone(),
            self.generation.clone(),
        );
        let reply = self.send_request(&request).await?;

        // Commit to history only after a successful exchange, so a failed
        // send can be retried without duplicating the user message.
        self.history.push(user_message);
        self.history.push(Content {
            role: "model".to_string(),
            parts: vec![Part {
                text: reply.clone(),
            }],
        });

        Ok(reply)
    }
}

fn build_request(
    history: &[Content],
    pending: Content,
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
) -> GenerateContentRequest {
    let mut contents = history.to_vec();
    contents.push(pending);
    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: Some(generation_config),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Clone)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Clone)]
struct Part {
    text: String,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
    response_mime_type: String,
}

impl GenerationConfig {
    fn from_chat(chat: &ChatConfig) -> Self {
        Self {
            temperature: chat.temperature,
            top_p: chat.top_p,
            top_k: chat.top_k,
            max_output_tokens: chat.max_output_tokens,
            response_mime_type: chat.response_mime_type.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            EduvoxError::backend(
                None,
                "Gemini API returned no text in the response candidates",
                false,
            )
        })
}

fn map_http_error(status: StatusCode, body: String) -> EduvoxError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    EduvoxError::backend(Some(status.as_u16()), message, is_retryable)
}
