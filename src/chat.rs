use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::EndpointSettings;

const EMPTY_CONTENT: &str = "The model did not return any content.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub model: String,
}

impl ChatRequest {
    pub fn new(message: &str, model: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send_chat_request(&self, request: &ChatRequest) -> Result<ChatReply, anyhow::Error>;
}

pub struct OpenAiChatClient {
    settings: EndpointSettings,
    client: Client,
}

impl OpenAiChatClient {
    pub fn new(settings: EndpointSettings) -> OpenAiChatClient {
        OpenAiChatClient {
            settings,
            client: Client::new(),
        }
    }

    fn chat_completion_endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.api_endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatEndpoint for OpenAiChatClient {
    fn is_configured(&self) -> bool {
        self.settings.is_valid()
    }

    async fn send_chat_request(&self, request: &ChatRequest) -> Result<ChatReply, anyhow::Error> {
        if request.message.trim().is_empty() {
            bail!("The message must not be empty.");
        }
        if request.model.trim().is_empty() {
            bail!("The model must not be empty.");
        }
        if !self.is_configured() {
            let message = "The chat endpoint service is not configured.";
            error!("{}", message);
            bail!(message);
        }

        let request_body = ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text(request.message.clone()),
            }],
            model: request.model.clone(),
        };

        info!("Sending chat request to {}", self.settings.api_endpoint);
        let response = self
            .client
            .post(self.chat_completion_endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send chat request: {}", e);
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat endpoint returned {}: {}", status, body);
            return Err(anyhow!(provider_error(&body).unwrap_or_else(|| format!(
                "The chat endpoint returned HTTP {}.",
                status
            ))));
        }

        let completion = response.json::<ChatCompletionResponse>().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.text())
            .unwrap_or_default();
        let content = content.trim();

        if content.is_empty() {
            warn!("{}", EMPTY_CONTENT);
            bail!(EMPTY_CONTENT);
        }

        Ok(ChatReply {
            content: content.to_string(),
            model: request.model.clone(),
        })
    }
}

fn provider_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

#[derive(Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
}

#[derive(Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// Message content is either plain text or a list of typed parts.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    /// Text parts joined by newlines; non-text parts are ignored.
    pub fn text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text)
                .filter(|text| !text.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
