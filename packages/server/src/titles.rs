use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TitleConfig;

const PROMPT: &str = "You are an expert in photography. Generate a short, descriptive title \
for the following image. The title should be no more than 5 words. Do not include quotes in the title.";

const MAX_WORDS: usize = 5;

#[derive(Debug, Error)]
pub enum TitleError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("title service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("title service returned no usable title")]
    EmptyResponse,
}

/// A photo passed inline as `data:<image mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDataUri {
    mime: String,
    uri: String,
}

impl PhotoDataUri {
    pub fn parse(uri: &str) -> Result<Self, TitleError> {
        let uri = uri.trim();
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| TitleError::InvalidInput("Photo must be a data URI".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| TitleError::InvalidInput("Data URI has no payload".into()))?;
        let mime = meta.strip_suffix(";base64").ok_or_else(|| {
            TitleError::InvalidInput("Data URI must use base64 encoding".into())
        })?;
        if !mime.starts_with("image/") {
            return Err(TitleError::InvalidInput(format!(
                "Expected an image, got '{mime}'"
            )));
        }
        if payload.is_empty() {
            return Err(TitleError::InvalidInput("Data URI has no payload".into()));
        }
        Ok(Self {
            mime: mime.to_string(),
            uri: uri.to_string(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Suggests a title for a photo.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate(&self, photo: &PhotoDataUri) -> Result<String, TitleError>;
}

/// Strip quotes and collapse whitespace, keeping at most five words.
pub fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .split_whitespace()
        .map(|word| word.trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’' | '`')))
        .filter(|word| !word.is_empty())
        .take(MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Title generator backed by an OpenAI-compatible chat-completions API.
pub struct ChatTitleGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl ChatTitleGenerator {
    pub fn new(config: &TitleConfig) -> Result<Self, TitleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!(
            "Title generator initialized (model={}, url={})",
            config.model, config.base_url
        );
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }
}

#[async_trait]
impl TitleGenerator for ChatTitleGenerator {
    async fn generate(&self, photo: &PhotoDataUri) -> Result<String, TitleError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: PROMPT },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: photo.as_str(),
                        },
                    },
                ],
            }],
            max_tokens: 32,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let raw = response
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(raw = %raw, "Title service replied");
        clean_title(&raw).ok_or(TitleError::EmptyResponse)
    }
}
