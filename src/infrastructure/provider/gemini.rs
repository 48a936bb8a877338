//! Gemini API provider adapter (native text + vision)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ProviderClient, ProviderError};
use crate::domain::job::GenerationRequest;
use crate::domain::provider::ProviderId;

use super::http::{join_url, send_json};

const TEMPERATURE: f32 = 0.7;

// Request types for Gemini API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

// Response types for Gemini API

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini `generateContent` client
pub struct GeminiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a client against `base_url` (e.g. `.../v1beta`)
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Build the API URL
    fn api_url(&self, model: &str) -> String {
        join_url(&self.base_url, &format!("models/{}:generateContent", model))
    }

    /// Build the request body
    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if !request.prompt.is_empty() {
            parts.push(Part {
                text: Some(request.prompt.clone()),
                inline_data: None,
            });
        }
        if let Some(image) = &request.image {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type().to_string(),
                    data: image.to_base64(),
                }),
            });
        }

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        }
    }

    /// Extract text from response
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts: Vec<&str> = response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
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
            .post(self.api_url(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body);

        let response: GenerateContentResponse = send_json(http, cancel).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ProviderError::InvalidResponse(format!(
                "prompt blocked: {}",
                reason
            )));
        }

        let text = Self::extract_text(&response).ok_or(ProviderError::EmptyResponse)?;
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
    fn text_request_has_single_part() {
        let request = GenerationRequest::text("Fix this", "gemini-2.0-flash");
        let body = GeminiProvider::build_request(&request);

        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].role, "user");
        assert_eq!(body.contents[0].parts.len(), 1);
        assert_eq!(body.contents[0].parts[0].text.as_deref(), Some("Fix this"));
    }

    #[test]
    fn image_request_adds_inline_data() {
        let mut request = GenerationRequest::text("Describe", "m");
        request.image = Some(EncodedImage::png(vec![1, 2, 3]));
        let body = GeminiProvider::build_request(&request);

        let inline = body.contents[0].parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "AQID");
    }

    #[test]
    fn request_serializes_camel_case() {
        let body = GeminiProvider::build_request(&GenerationRequest::text("x", "m"));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("generationConfig").is_some());
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn api_url_contains_model() {
        let provider = GeminiProvider::new("https://example.test/v1beta/", reqwest::Client::new());
        assert_eq!(
            provider.api_url("gemini-2.0-flash"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            GeminiProvider::extract_text(&response),
            Some("Hello world".to_string())
        );
    }

    #[test]
    fn extract_text_empty_response() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(GeminiProvider::extract_text(&response).is_none());
    }
}
