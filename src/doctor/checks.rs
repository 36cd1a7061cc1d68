//! The individual verification steps. Every check is a single attempt
//! against one endpoint and converts any network condition (timeout,
//! refused connection, malformed body, non-2xx) into a `CheckResult`;
//! nothing here returns an error.

use super::issue::{Issue, RemediationAction};
use crate::http::{self, ApiError};
use crate::liveness::LivenessProbe;
use crate::openai::OpenAiClient;
use crate::telegram::{TelegramApi, WebhookInfo};
use crate::util::truncate_with_ellipsis;

const ENDPOINT_TIMEOUT_SECS: u64 = 10;

/// Outcome of one verification step. Lives only for the duration of the
/// step; its issues are appended to the run's sequence by the orchestrator.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub success: bool,
    pub detail: Option<String>,
    pub issues: Vec<Issue>,
}

impl CheckResult {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail: Some(detail.into()),
            issues: Vec::new(),
        }
    }

    pub fn fail(issue: Issue) -> Self {
        Self {
            success: false,
            detail: None,
            issues: vec![issue],
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Check 1: is the worker endpoint reachable, and does it answer sanely?
pub async fn check_endpoint(url: &str) -> CheckResult {
    let client = http::client(ENDPOINT_TIMEOUT_SECS);
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            return CheckResult::fail(Issue::EndpointUnreachable {
                url: url.to_string(),
                reason,
            });
        }
    };

    match response.status().as_u16() {
        200 => {
            let body = response.text().await.unwrap_or_default();
            CheckResult::ok(format!("HTTP 200: {}", truncate_with_ellipsis(&body, 80)))
        }
        404 => CheckResult::fail(Issue::EndpointWrongPath {
            url: url.to_string(),
        }),
        403 => CheckResult::fail(Issue::EndpointRestricted {
            url: url.to_string(),
        }),
        status if (200..300).contains(&status) => CheckResult::ok(format!("HTTP {status}")),
        status => CheckResult::fail(Issue::EndpointHttpError {
            url: url.to_string(),
            status,
        }),
    }
}

/// Check 2: does the platform accept the bot token?
pub async fn check_bot_credential(api: &TelegramApi) -> CheckResult {
    match api.get_me().await {
        Ok(profile) => CheckResult::ok(format!(
            "{} (id {})",
            profile.display_name(),
            profile.id
        )),
        Err(ApiError::Rejected(description)) => CheckResult::fail(Issue::InvalidBotToken {
            detail: description,
        }),
        Err(err @ ApiError::Status { .. }) => {
            let detail = match err.detail() {
                Some(body) => format!("{err} ({})", truncate_with_ellipsis(body, 120)),
                None => err.to_string(),
            };
            CheckResult::fail(Issue::InvalidBotToken { detail })
        }
        Err(e) => CheckResult::fail(Issue::BotApiUnreachable {
            reason: e.to_string(),
        }),
    }
}

/// Check 3: does the model API accept the key?
pub async fn check_model_credential(client: &OpenAiClient) -> CheckResult {
    match client.list_models().await {
        Ok(count) => CheckResult::ok(format!("{count} models visible")),
        Err(e) if e.status() == Some(401) => CheckResult::fail(Issue::InvalidModelKey),
        Err(e) => CheckResult::fail(Issue::ModelApiError {
            detail: e.to_string(),
        }),
    }
}

/// Check 4: inspect the registered webhook. A configured-but-different
/// target is a non-fatal mismatch; a recorded delivery error carries the
/// platform's message verbatim; a pending backlog is a note, not an issue.
pub async fn check_webhook(api: &TelegramApi, expected_base: Option<&str>) -> CheckResult {
    let info = match api.get_webhook_info().await {
        Ok(info) => info,
        Err(e) => {
            return CheckResult::fail(Issue::WebhookInspectFailed {
                reason: e.to_string(),
            });
        }
    };

    if info.url.is_empty() {
        return CheckResult::fail(Issue::NoWebhook);
    }

    let mut issues = Vec::new();
    let mut success = true;

    if let Some(expected) = expected_base {
        if !info.url.contains(expected) {
            issues.push(Issue::WebhookMismatch {
                expected: expected.to_string(),
                actual: info.url.clone(),
            });
        }
    }

    if let Some(message) = &info.last_error_message {
        issues.push(Issue::WebhookDeliveryError {
            message: message.clone(),
        });
        success = false;
    }

    CheckResult {
        success,
        detail: Some(describe_webhook(&info)),
        issues,
    }
}

fn describe_webhook(info: &WebhookInfo) -> String {
    let mut detail = info.url.clone();
    if info.pending_update_count > 0 {
        detail.push_str(&format!(
            "; {} pending updates (botmend webhook drain discards them)",
            info.pending_update_count
        ));
    }
    detail
}

/// Check 5 (conditional): point the webhook at the canonical callback
/// URL. One attempt, no retry.
pub async fn remediate_webhook(api: &TelegramApi, target: &str) -> CheckResult {
    match api.set_webhook(target).await {
        Ok(true) => CheckResult::ok(format!("webhook set to {target}")),
        Ok(false) => CheckResult::fail(Issue::WebhookSetFailed {
            detail: "platform answered false".to_string(),
        }),
        Err(ApiError::Rejected(description)) => CheckResult::fail(Issue::WebhookSetFailed {
            detail: description,
        }),
        Err(e) => CheckResult::fail(Issue::WebhookSetFailed {
            detail: e.to_string(),
        }),
    }
}

/// Execute one remediation action. Single attempt, failures recorded,
/// never retried, never escalated.
pub async fn apply_remediation(api: &TelegramApi, action: &RemediationAction) -> CheckResult {
    match action {
        RemediationAction::SetWebhook { url } => remediate_webhook(api, url).await,
        RemediationAction::DrainBacklog => match api.drain_updates().await {
            Ok(()) => CheckResult::ok("pending updates discarded"),
            Err(e) => CheckResult::fail(Issue::DrainFailed {
                detail: e.to_string(),
            }),
        },
    }
}

/// Check 6 (conditional): end-to-end delivery smoke test.
pub async fn check_delivery(api: &TelegramApi, chat_id: &str) -> CheckResult {
    let text = format!(
        "🔧 Diagnostic test message\nTime: {}\nStatus: checking bot connectivity",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    match api.send_message(chat_id, &text, false).await {
        Ok(_) => CheckResult::ok("test message sent; check the chat"),
        Err(ApiError::Rejected(description)) => CheckResult::fail(Issue::SendFailed {
            detail: description,
        }),
        Err(e) => CheckResult::fail(Issue::SendFailed {
            detail: e.to_string(),
        }),
    }
}

/// Check 7 (environment variant): best-effort liveness. Advisory only.
pub async fn check_liveness(probe: &dyn LivenessProbe) -> CheckResult {
    let report = probe.check().await;
    if report.alive {
        CheckResult::ok(report.detail)
    } else {
        CheckResult::fail(Issue::NotAlive {
            detail: report.detail.clone(),
        })
        .with_detail(report.detail)
    }
}
