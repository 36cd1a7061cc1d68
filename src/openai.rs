//! OpenAI-compatible model API client: credential validation via the
//! model listing, plus a one-shot completion for end-to-end smoke tests.

use crate::http::{self, ApiError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[allow(dead_code)]
    id: String,
}

pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(None, api_key)
    }

    /// Create a client with an optional custom base URL. Defaults to the
    /// public endpoint when `base_url` is `None`.
    pub fn with_base_url(base_url: Option<&str>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.into(),
            client: http::client(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Validate the credential against the model listing. Returns the
    /// number of models visible to the key.
    pub async fn list_models(&self) -> Result<usize, ApiError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let list: ModelList = response.json().await?;
        Ok(list.data.len())
    }

    /// One chat completion: role-tagged message list in, single text out.
    pub async fn complete(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
    ) -> Result<String, ApiError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: message.to_string(),
        });

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            max_tokens: 500,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::Malformed("completion without content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_to_public_endpoint() {
        let client = OpenAiClient::new("sk-test");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_override_trims_trailing_slash() {
        let client = OpenAiClient::with_base_url(Some("http://localhost:1234/"), "sk-test");
        assert_eq!(client.base_url, "http://localhost:1234");
    }

    #[test]
    fn model_list_tolerates_missing_data() {
        let list: ModelList = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_empty());
    }
}
