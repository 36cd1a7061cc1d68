//! The diagnostic pipeline: an ordered sequence of independent checks,
//! append-only issue accumulation, conditional remediation, and a final
//! summary. One run owns its issue sequence; checks execute strictly one
//! at a time.

pub mod checks;
pub mod issue;
mod report;

pub use checks::CheckResult;
pub use issue::{Issue, RemediationAction, Suggestion};

use crate::artifact;
use crate::config::{ConfigKey, Resolution};
use crate::liveness::{HealthUrlProbe, LivenessProbe, ProcessScanProbe};
use crate::openai::OpenAiClient;
use crate::telegram::TelegramApi;
use crate::util::mask_secret;
use std::path::PathBuf;

const TOTAL_STEPS: u8 = 7;

/// Whether detected problems get repaired in-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixMode {
    /// Report only; remediation is suggested, never executed.
    Never,
    /// Confirm each fix on stdin before applying it.
    Ask,
    /// Apply fixes without asking.
    Auto,
}

#[derive(Debug, Clone)]
pub struct DoctorOptions {
    pub fix: FixMode,
    /// Run the liveness step. Off in the interactive variant, where the
    /// operator is typically not on the deployment host.
    pub liveness: bool,
    /// Where generated artifacts land; `None` disables emission.
    pub artifact_dir: Option<PathBuf>,
    pub telegram_api_base: Option<String>,
    pub openai_api_base: Option<String>,
}

impl Default for DoctorOptions {
    fn default() -> Self {
        Self {
            fix: FixMode::Never,
            liveness: true,
            artifact_dir: None,
            telegram_api_base: None,
            openai_api_base: None,
        }
    }
}

/// Everything a single run found and did. All issues are always shown;
/// the process exits 0 regardless of how many there are.
#[derive(Debug, Default)]
pub struct Report {
    pub statuses: Vec<(&'static str, bool)>,
    pub issues: Vec<Issue>,
    pub fixes_applied: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl Report {
    pub fn healthy(&self) -> bool {
        self.issues.is_empty()
    }

    fn record(&mut self, name: &'static str, result: CheckResult) -> bool {
        report::print_check(&result);
        let success = result.success;
        self.statuses.push((name, success));
        self.issues.extend(result.issues);
        success
    }

    fn skip(&mut self, name: &'static str, reason: &str) {
        report::print_skip(reason);
        self.statuses.push((name, false));
    }
}

/// Run the full pipeline against the resolved configuration.
pub async fn run(resolution: &Resolution, opts: &DoctorOptions) -> Report {
    let settings = &resolution.settings;
    let mut rep = Report::default();

    report::print_header();

    report::print_step(1, TOTAL_STEPS, "Configuration");
    for key in ConfigKey::ALL {
        match settings.get(key) {
            Some(value) if key.is_secret() => {
                println!("  ✅ {key} is set ({})", mask_secret(value));
            }
            Some(value) => println!("  ✅ {key} is set ({value})"),
            None => println!("  ❌ {key} is missing"),
        }
    }

    // Fatal precondition: without the bot token no check has meaningful
    // input, so the run halts before any HTTP call with exactly one issue.
    if settings.bot_token.is_none() {
        report::print_fatal("cannot run checks without TELEGRAM_BOT_TOKEN");
        rep.statuses.push(("Configuration", false));
        rep.issues.push(Issue::MissingConfig {
            key: ConfigKey::BotToken,
        });
        rep.suggestions = issue::suggestions(&rep.issues, settings.webhook_target().as_deref());
        report::render_summary(&rep);
        return rep;
    }

    rep.statuses
        .push(("Configuration", resolution.missing.is_empty()));
    for key in &resolution.missing {
        rep.issues.push(Issue::MissingConfig { key: *key });
    }

    report::print_step(2, TOTAL_STEPS, "Worker endpoint");
    match settings.worker_url.as_deref() {
        Some(url) => {
            rep.record("Worker endpoint", checks::check_endpoint(url).await);
        }
        None => rep.skip("Worker endpoint", "no WORKER_URL configured"),
    }

    report::print_step(3, TOTAL_STEPS, "Bot credential");
    let mut api = TelegramApi::new(settings.bot_token.clone().unwrap_or_default());
    if let Some(base) = &opts.telegram_api_base {
        api = api.with_api_base(base.clone());
    }
    let bot_ok = rep.record("Bot credential", checks::check_bot_credential(&api).await);

    report::print_step(4, TOTAL_STEPS, "Model API credential");
    match settings.model_api_key.as_deref() {
        Some(key) => {
            let client = OpenAiClient::with_base_url(opts.openai_api_base.as_deref(), key);
            rep.record(
                "Model API credential",
                checks::check_model_credential(&client).await,
            );
        }
        None => rep.skip("Model API credential", "no OPENAI_API_KEY configured"),
    }

    report::print_step(5, TOTAL_STEPS, "Webhook");
    if bot_ok {
        let result = checks::check_webhook(&api, settings.expected_webhook_base()).await;
        let needs_webhook = result.issues.contains(&Issue::NoWebhook);
        rep.record("Webhook", result);

        if needs_webhook {
            match settings.webhook_target() {
                Some(target) => {
                    if should_fix(opts.fix, &target).await {
                        let action = RemediationAction::SetWebhook {
                            url: target.clone(),
                        };
                        let fix = checks::apply_remediation(&api, &action).await;
                        if fix.success {
                            rep.fixes_applied.push(action.describe());
                        }
                        rep.record("Webhook remediation", fix);
                    } else {
                        report::print_note(&format!("run `botmend webhook set {target}` to fix"));
                    }
                }
                None => report::print_note(
                    "no WORKER_URL or WEBHOOK_URL to derive a webhook target from",
                ),
            }
        }
    } else {
        rep.skip("Webhook", "bot credential check failed");
    }

    report::print_step(6, TOTAL_STEPS, "Message delivery");
    match settings.chat_id.as_deref() {
        Some(chat_id) if bot_ok => {
            rep.record("Message delivery", checks::check_delivery(&api, chat_id).await);
        }
        Some(_) => rep.skip("Message delivery", "bot credential check failed"),
        None => rep.skip("Message delivery", "no TELEGRAM_CHAT_ID configured"),
    }

    report::print_step(7, TOTAL_STEPS, "Liveness");
    if opts.liveness {
        let probe: Box<dyn LivenessProbe> = match settings.worker_url.as_deref() {
            Some(url) => Box::new(HealthUrlProbe::for_worker(url)),
            None => Box::new(ProcessScanProbe::new(&settings.process_patterns)),
        };
        report::print_note(&format!(
            "{} (advisory; false negatives expected under containers)",
            probe.name()
        ));
        rep.record("Liveness", checks::check_liveness(probe.as_ref()).await);
    } else {
        report::print_skip("interactive run");
    }

    rep.suggestions = issue::suggestions(&rep.issues, settings.webhook_target().as_deref());

    if let Some(dir) = &opts.artifact_dir {
        if !rep.issues.is_empty() {
            if let Some(path) = artifact::emit_fix_script(dir, settings) {
                report::print_note(&format!("wrote {}", path.display()));
            }
            let needs_worker_template = rep.issues.iter().any(|i| {
                matches!(
                    i,
                    Issue::EndpointWrongPath { .. }
                        | Issue::NoWebhook
                        | Issue::WebhookDeliveryError { .. }
                )
            });
            if needs_worker_template {
                if let Some(path) = artifact::emit_worker_template(dir) {
                    report::print_note(&format!("wrote {}", path.display()));
                }
            }
        }
    }

    report::render_summary(&rep);
    rep
}

async fn should_fix(mode: FixMode, target: &str) -> bool {
    match mode {
        FixMode::Never => false,
        FixMode::Auto => true,
        FixMode::Ask => {
            let prompt = format!("Set the webhook to {target} now?");
            tokio::task::spawn_blocking(move || {
                dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(true)
                    .interact()
                    .unwrap_or(false)
            })
            .await
            .unwrap_or(false)
        }
    }
}
