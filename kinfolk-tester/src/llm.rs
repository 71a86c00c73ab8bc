//! Live narration over an OpenAI-compatible chat completion endpoint.
//!
//! The engine asks for text synchronously, so the source owns a small
//! current-thread runtime and blocks on each request.

use kinfolk_game::narrative::SYSTEM_PROMPT;
use kinfolk_game::{ContextBlock, NarrativeError, NarrativeSource};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 200;

#[derive(Debug, Error)]
pub enum LlmConfigError {
    #[error("LLM_API_KEY not set")]
    MissingKey,
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub struct ChatCompletionSource {
    client: Client,
    runtime: tokio::runtime::Runtime,
    api_key: String,
    api_url: String,
    model: String,
}

impl ChatCompletionSource {
    /// Create a source with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or runtime cannot be built.
    pub fn new(api_key: String, api_url: String, model: String) -> Result<Self, LlmConfigError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            api_key,
            api_url,
            model,
        })
    }

    /// Create a source from environment variables
    ///
    /// Required: `LLM_API_KEY`
    /// Optional: `LLM_API_URL`, `LLM_MODEL`
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or the client cannot be built.
    pub fn from_env() -> Result<Self, LlmConfigError> {
        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmConfigError::MissingKey)?;
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(api_key, api_url, model)
    }

    fn build_request(&self, prompt: &str, context: &[ContextBlock]) -> ChatRequest {
        let mut user = prompt.to_string();
        for block in context {
            user.push_str("\n\n");
            user.push_str(&block.content.to_string());
        }
        ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: user,
                },
            ],
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, NarrativeError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Transport(format!("API error {status}: {body}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;
        first_choice(completion)
    }
}

impl NarrativeSource for ChatCompletionSource {
    fn generate(&mut self, prompt: &str, context: &[ContextBlock]) -> Result<String, NarrativeError> {
        let request = self.build_request(prompt, context);
        self.runtime.block_on(self.complete(&request))
    }

    fn label(&self) -> &'static str {
        "chat-completion"
    }
}

fn transport_error(err: reqwest::Error) -> NarrativeError {
    if err.is_timeout() {
        NarrativeError::Timeout
    } else {
        NarrativeError::Transport(err.to_string())
    }
}

fn first_choice(completion: ChatResponse) -> Result<String, NarrativeError> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(NarrativeError::Empty)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}
