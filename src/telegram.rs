//! Telegram Bot API client: the handful of methods the diagnostic
//! pipeline and remediation actions consume.

use crate::http::{self, ApiError};
use serde::Deserialize;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Platform response envelope: `ok` plus either a `result` payload or a
/// human-readable `description`.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// `getMe` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BotProfile {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

impl BotProfile {
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => self.first_name.clone(),
        }
    }
}

/// `getWebhookInfo` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
    #[serde(default)]
    pub last_error_date: Option<i64>,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

pub struct TelegramApi {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramApi {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client: http::client(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Point the client at a different API base (tests).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// POST `method` and unwrap the platform envelope. A 200 with
    /// `ok: false` surfaces as `ApiError::Rejected` carrying the
    /// platform's description.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
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

        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.ok {
            return Err(ApiError::Rejected(
                envelope
                    .description
                    .unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        envelope
            .result
            .ok_or_else(|| ApiError::Malformed("envelope without result".to_string()))
    }

    pub async fn get_me(&self) -> Result<BotProfile, ApiError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, ApiError> {
        self.call("getWebhookInfo", &serde_json::json!({})).await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<bool, ApiError> {
        let body = serde_json::json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"]
        });
        self.call("setWebhook", &body).await
    }

    pub async fn delete_webhook(&self) -> Result<bool, ApiError> {
        self.call("deleteWebhook", &serde_json::json!({})).await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markdown: bool,
    ) -> Result<serde_json::Value, ApiError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if markdown {
            body["parse_mode"] = serde_json::Value::String("Markdown".to_string());
        }
        self.call("sendMessage", &body).await
    }

    /// Discard the pending update backlog by polling with offset -1.
    pub async fn drain_updates(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .call("getUpdates", &serde_json::json!({ "offset": -1 }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_embeds_token_and_method() {
        let api = TelegramApi::new("123:ABC");
        assert_eq!(
            api.api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    #[test]
    fn with_api_base_trims_trailing_slash() {
        let api = TelegramApi::new("t").with_api_base("http://localhost:9999/");
        assert_eq!(api.api_url("getMe"), "http://localhost:9999/bott/getMe");
    }

    #[test]
    fn profile_display_name_prefers_username() {
        let with_username = BotProfile {
            id: 1,
            username: Some("newsbot".into()),
            first_name: "News".into(),
        };
        assert_eq!(with_username.display_name(), "@newsbot");

        let without = BotProfile {
            id: 2,
            username: None,
            first_name: "News".into(),
        };
        assert_eq!(without.display_name(), "News");
    }

    #[test]
    fn webhook_info_defaults_are_empty() {
        let info: WebhookInfo = serde_json::from_str("{}").unwrap();
        assert!(info.url.is_empty());
        assert_eq!(info.pending_update_count, 0);
        assert!(info.last_error_message.is_none());
    }

    #[test]
    fn webhook_info_parses_error_fields() {
        let info: WebhookInfo = serde_json::from_value(serde_json::json!({
            "url": "https://x.dev/webhook",
            "pending_update_count": 3,
            "last_error_date": 1_700_000_000,
            "last_error_message": "Connection refused"
        }))
        .unwrap();
        assert_eq!(info.url, "https://x.dev/webhook");
        assert_eq!(info.pending_update_count, 3);
        assert_eq!(info.last_error_message.as_deref(), Some("Connection refused"));
    }
}
