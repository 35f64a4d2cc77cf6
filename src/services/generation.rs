// src/services/generation.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::encoder::TransportPayload;
use crate::errors::MermaiderError;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DRAFT_MODEL: &str = "gpt-4o-mini";
const STYLE_MODEL: &str = "gpt-4o";
const MAX_OUTPUT_TOKENS: u32 = 1000;

/// The generation service seam. One attempt per call, no retries; stage code
/// and tests depend on this trait rather than on the OpenAI wire format.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Vision request: instruction text plus one inlined image.
    async fn generate_from_image(
        &self,
        instruction: &str,
        image: &TransportPayload,
    ) -> Result<String, MermaiderError>;

    /// Text-only request with a system-level guide.
    async fn generate_from_text(
        &self,
        system_guide: &str,
        instruction: &str,
    ) -> Result<String, MermaiderError>;
}

pub struct OpenAiBackend {
    api_key: String,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }

    async fn complete(&self, body: serde_json::Value) -> Result<String, MermaiderError> {
        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| MermaiderError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MermaiderError::Generation(format!(
                "upstream returned {}: {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MermaiderError::Generation(format!("unparsable response: {}", e)))?;

        if result["choices"][0]["finish_reason"] == "length" {
            return Err(MermaiderError::Generation(
                "output exceeded the token limit".to_string(),
            ));
        }
        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| MermaiderError::Generation("no content in response".to_string()))?;
        if content.trim().is_empty() {
            return Err(MermaiderError::Generation("empty response".to_string()));
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate_from_image(
        &self,
        instruction: &str,
        image: &TransportPayload,
    ) -> Result<String, MermaiderError> {
        self.complete(json!({
            "model": DRAFT_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": instruction },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", image.media_type, image.data)
                        }
                    }
                ]
            }],
            "max_tokens": MAX_OUTPUT_TOKENS
        }))
        .await
    }

    async fn generate_from_text(
        &self,
        system_guide: &str,
        instruction: &str,
    ) -> Result<String, MermaiderError> {
        self.complete(json!({
            "model": STYLE_MODEL,
            "messages": [
                { "role": "system", "content": system_guide },
                { "role": "user", "content": instruction }
            ],
            "max_tokens": MAX_OUTPUT_TOKENS,
            // Styling must be reproducible for the same draft.
            "temperature": 0
        }))
        .await
    }
}
