//! Configuration resolution: env file, process environment, and (in the
//! interactive variant) stdin prompts, in that precedence.

mod env_file;

pub use env_file::EnvFile;

use crate::util::ensure_https;
use dialoguer::{Input, Password};
use std::fmt;

/// Optional comma-separated override for the process-scan liveness probe.
const PROCESS_PATTERNS_VAR: &str = "BOT_PROCESS";

/// The fixed set of values the pipeline runs on. Absence of a key is a
/// distinct, reportable state; no key is ever partially set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    BotToken,
    ModelApiKey,
    ChatId,
    WebhookUrl,
    WorkerUrl,
}

impl ConfigKey {
    pub const ALL: [Self; 5] = [
        Self::BotToken,
        Self::ModelApiKey,
        Self::ChatId,
        Self::WebhookUrl,
        Self::WorkerUrl,
    ];

    pub fn env_var(self) -> &'static str {
        match self {
            Self::BotToken => "TELEGRAM_BOT_TOKEN",
            Self::ModelApiKey => "OPENAI_API_KEY",
            Self::ChatId => "TELEGRAM_CHAT_ID",
            Self::WebhookUrl => "WEBHOOK_URL",
            Self::WorkerUrl => "WORKER_URL",
        }
    }

    /// Core credentials gate the whole run; the rest only disable the
    /// checks that need them.
    pub fn is_core_credential(self) -> bool {
        matches!(self, Self::BotToken | Self::ModelApiKey)
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Self::BotToken | Self::ModelApiKey)
    }

    fn prompt_label(self) -> &'static str {
        match self {
            Self::BotToken => "Telegram bot token (from @BotFather)",
            Self::ModelApiKey => "OpenAI API key",
            Self::ChatId => "Telegram chat id (blank to skip delivery test)",
            Self::WebhookUrl => "Webhook URL (blank to derive from worker URL)",
            Self::WorkerUrl => "Worker URL (e.g. your-bot.workers.dev)",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// One place a configuration value can come from.
pub trait Source {
    fn name(&self) -> &'static str;

    /// Raw variable lookup. Prompting sources only answer for the fixed
    /// key set and return `None` here.
    fn lookup_var(&self, var: &str) -> Option<String>;

    fn lookup(&self, key: ConfigKey) -> Option<String> {
        self.lookup_var(key.env_var())
    }
}

impl Source for EnvFile {
    fn name(&self) -> &'static str {
        "env file"
    }

    fn lookup_var(&self, var: &str) -> Option<String> {
        self.get(var)
    }
}

/// The process environment.
pub struct ProcessEnv;

impl Source for ProcessEnv {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn lookup_var(&self, var: &str) -> Option<String> {
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }
}

/// Interactive stdin prompts, the last-resort source of the prompt-driven
/// variant. Blank input leaves the key absent.
pub struct Prompt;

impl Source for Prompt {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn lookup_var(&self, _var: &str) -> Option<String> {
        None
    }

    fn lookup(&self, key: ConfigKey) -> Option<String> {
        let value = if key.is_secret() {
            Password::new()
                .with_prompt(key.prompt_label())
                .allow_empty_password(true)
                .interact()
                .ok()?
        } else {
            Input::<String>::new()
                .with_prompt(key.prompt_label())
                .allow_empty(true)
                .interact_text()
                .ok()?
        };
        let value = value.trim().to_string();
        if value.is_empty() { None } else { Some(value) }
    }
}

/// The resolved configuration a single pipeline run owns.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub bot_token: Option<String>,
    pub model_api_key: Option<String>,
    pub chat_id: Option<String>,
    pub webhook_url: Option<String>,
    pub worker_url: Option<String>,
    /// Patterns for the process-scan liveness fallback.
    pub process_patterns: Vec<String>,
}

impl Settings {
    pub fn get(&self, key: ConfigKey) -> Option<&str> {
        match key {
            ConfigKey::BotToken => self.bot_token.as_deref(),
            ConfigKey::ModelApiKey => self.model_api_key.as_deref(),
            ConfigKey::ChatId => self.chat_id.as_deref(),
            ConfigKey::WebhookUrl => self.webhook_url.as_deref(),
            ConfigKey::WorkerUrl => self.worker_url.as_deref(),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: String) {
        let slot = match key {
            ConfigKey::BotToken => &mut self.bot_token,
            ConfigKey::ModelApiKey => &mut self.model_api_key,
            ConfigKey::ChatId => &mut self.chat_id,
            ConfigKey::WebhookUrl => &mut self.webhook_url,
            ConfigKey::WorkerUrl => &mut self.worker_url,
        };
        *slot = Some(value);
    }

    /// The URL the webhook is expected to point under: the explicit
    /// webhook URL when set, otherwise the worker URL.
    pub fn expected_webhook_base(&self) -> Option<&str> {
        self.webhook_url.as_deref().or(self.worker_url.as_deref())
    }

    /// Canonical callback target for remediation.
    pub fn webhook_target(&self) -> Option<String> {
        self.expected_webhook_base()
            .map(crate::util::canonical_webhook_url)
    }
}

/// A resolved configuration plus the keys no source could supply, in
/// key-set order.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub settings: Settings,
    pub missing: Vec<ConfigKey>,
}

/// Walk the prioritized sources for every key. Performs no I/O beyond
/// reading (and prompting, when a `Prompt` source is supplied); URLs are
/// normalized here so no request is ever issued against a scheme-less
/// value.
pub fn resolve(sources: &[&dyn Source]) -> Resolution {
    let mut settings = Settings::default();
    let mut missing = Vec::new();

    for key in ConfigKey::ALL {
        let mut found = None;
        for source in sources {
            if let Some(value) = source.lookup(key) {
                tracing::debug!("{key} resolved from {}", source.name());
                found = Some(value);
                break;
            }
        }
        match found {
            Some(value) => settings.set(key, value),
            None => missing.push(key),
        }
    }

    if let Some(url) = settings.worker_url.take() {
        settings.worker_url = Some(ensure_https(&url));
    }
    if let Some(url) = settings.webhook_url.take() {
        settings.webhook_url = Some(ensure_https(&url));
    }

    settings.process_patterns = sources
        .iter()
        .find_map(|s| s.lookup_var(PROCESS_PATTERNS_VAR))
        .map(|raw| {
            raw.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Resolution { settings, missing }
}
