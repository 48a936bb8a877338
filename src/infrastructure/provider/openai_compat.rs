//! OpenAI-compatible chat-completions provider adapter
//!
//! Works against OpenAI, OpenRouter and any endpoint speaking the same
//! `/chat/completions` dialect.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ProviderClient, ProviderError};
use crate::domain::job::GenerationRequest;
use crate::domain::provider::ProviderId;

use super::http::{join_url, send_json};

const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

/// Plain string for text-only calls, part list when an image is attached
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client with bearer authentication
pub struct OpenAiCompatProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn build_request(request: &GenerationRequest) -> ChatRequest {
        let content = match &request.image {
            None => MessageContent::Text(request.prompt.clone()),
            Some(image) => {
                let mut parts = Vec::with_capacity(2);
                if !request.prompt.is_empty() {
                    parts.push(ContentPart::Text {
                        text: request.prompt.clone(),
                    });
                }
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.to_data_url(),
                    },
                });
                MessageContent::Parts(parts)
            }
        };

        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let body = Self::build_request(request);
        let http = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(api_key)
            .json(&body);

        let response: ChatResponse = send_json(http, cancel).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(ProviderError::EmptyResponse)?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::EncodedImage;

    #[test]
    fn text_request_uses_plain_content() {
        let body = OpenAiCompatProvider::build_request(&GenerationRequest::text(
            "Fix grammar.\n\nteh cat",
            "deepseek/deepseek-chat",
        ));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek/deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Fix grammar.\n\nteh cat");
    }

    #[test]
    fn image_request_uses_data_url_part() {
        let mut request = GenerationRequest::text("Describe", "openai/gpt-4o");
        request.image = Some(EncodedImage::png(vec![1, 2, 3]));
        let json = serde_json::to_value(OpenAiCompatProvider::build_request(&request)).unwrap();

        let parts = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AQID");
    }

    #[test]
    fn response_without_choices_parses() {
        let response: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(response.choices.is_empty());
    }
}
