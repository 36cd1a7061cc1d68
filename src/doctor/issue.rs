//! The closed set of problems a diagnostic run can record, and the
//! corrective actions selected from them.

use crate::config::ConfigKey;

/// One detected misconfiguration or failure. Issues are appended in
/// detection order during a run and never mutated afterwards; their
/// `Display` text is what the operator sees in the summary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Issue {
    #[error("{key} is not configured")]
    MissingConfig { key: ConfigKey },

    #[error("worker returned 404 on {url} (wrong path)")]
    EndpointWrongPath { url: String },

    #[error("worker at {url} has access restrictions (HTTP 403)")]
    EndpointRestricted { url: String },

    #[error("worker at {url} returned HTTP {status}")]
    EndpointHttpError { url: String, status: u16 },

    #[error("worker at {url} unreachable: {reason}")]
    EndpointUnreachable { url: String, reason: String },

    #[error("bot token rejected: {detail}")]
    InvalidBotToken { detail: String },

    #[error("bot credential check failed: {reason}")]
    BotApiUnreachable { reason: String },

    #[error("model API key is invalid or expired")]
    InvalidModelKey,

    #[error("model API check failed: {detail}")]
    ModelApiError { detail: String },

    #[error("no webhook URL configured")]
    NoWebhook,

    #[error("webhook points at {actual}, expected a URL under {expected}")]
    WebhookMismatch { expected: String, actual: String },

    #[error("webhook inspection failed: {reason}")]
    WebhookInspectFailed { reason: String },

    #[error("webhook error: {message}")]
    WebhookDeliveryError { message: String },

    #[error("failed to set webhook: {detail}")]
    WebhookSetFailed { detail: String },

    #[error("test message not delivered: {detail}")]
    SendFailed { detail: String },

    #[error("failed to discard update backlog: {detail}")]
    DrainFailed { detail: String },

    #[error("bot process check failed: {detail}")]
    NotAlive { detail: String },
}

/// One corrective step. Constructed after a check flags the problem,
/// executed once, then discarded. A process restart is never executed
/// from here; it surfaces as a suggestion and in the fix script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationAction {
    SetWebhook { url: String },
    DrainBacklog,
}

impl RemediationAction {
    pub fn describe(&self) -> String {
        match self {
            Self::SetWebhook { url } => format!("set webhook to {url}"),
            Self::DrainBacklog => "discarded pending update backlog".to_string(),
        }
    }
}

/// A human-readable fix the operator can act on.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub title: String,
    pub lines: Vec<String>,
}

/// Map the accumulated issues onto fix suggestions. Trigger conditions:
/// no-webhook selects a set-webhook fix, a 404 selects a routing fix, a
/// webhook delivery error selects log inspection (manual, never cleared
/// automatically), and a missing core credential always selects the
/// configuration template regardless of everything else.
pub fn suggestions(issues: &[Issue], webhook_target: Option<&str>) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if issues.iter().any(|i| matches!(i, Issue::NoWebhook)) {
        let target = webhook_target.unwrap_or("https://<your-worker>/webhook");
        out.push(Suggestion {
            title: "Set the webhook".to_string(),
            lines: vec![
                "Point the platform at your worker:".to_string(),
                format!("  botmend webhook set {target}"),
                "or with curl:".to_string(),
                format!(
                    "  curl -X POST https://api.telegram.org/bot<TOKEN>/setWebhook -d 'url={target}'"
                ),
            ],
        });
    }

    if issues
        .iter()
        .any(|i| matches!(i, Issue::EndpointWrongPath { .. }))
    {
        out.push(Suggestion {
            title: "Fix worker routes".to_string(),
            lines: vec![
                "Ensure your worker handles these paths:".to_string(),
                "  /webhook  - POSTed platform updates".to_string(),
                "  /health   - health checks".to_string(),
                "  /         - root path".to_string(),
                "botmend emit worker-template writes a reference implementation.".to_string(),
            ],
        });
    }

    if issues
        .iter()
        .any(|i| matches!(i, Issue::WebhookDeliveryError { .. }))
    {
        out.push(Suggestion {
            title: "Inspect worker logs".to_string(),
            lines: vec![
                "The platform recorded a delivery error. Check the worker dashboard logs for:"
                    .to_string(),
                "  - missing environment variables (API keys)".to_string(),
                "  - responses slower than 10 seconds".to_string(),
                "  - upstream API failures".to_string(),
            ],
        });
    }

    if issues.iter().any(|i| matches!(i, Issue::NotAlive { .. })) {
        out.push(Suggestion {
            title: "Restart the bot process".to_string(),
            lines: vec![
                "The liveness probe found nothing running. The generated".to_string(),
                "botmend-fix.sh restarts the process after re-pointing the webhook.".to_string(),
            ],
        });
    }

    let missing_core = issues.iter().any(|i| {
        matches!(i, Issue::MissingConfig { key } if key.is_core_credential())
    });
    if missing_core {
        out.push(Suggestion {
            title: "Complete the configuration".to_string(),
            lines: vec![
                "Create a .env file with:".to_string(),
                "  TELEGRAM_BOT_TOKEN=your_bot_token".to_string(),
                "  OPENAI_API_KEY=your_openai_key".to_string(),
                "  TELEGRAM_CHAT_ID=your_chat_id".to_string(),
                "  WORKER_URL=https://your-bot.workers.dev".to_string(),
            ],
        });
    }

    out
}
