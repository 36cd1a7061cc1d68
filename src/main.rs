#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{Result, anyhow};
use botmend::config::{self, ConfigKey, EnvFile, Resolution, Settings};
use botmend::doctor::issue::RemediationAction;
use botmend::doctor::{self, DoctorOptions, FixMode, checks};
use botmend::telegram::TelegramApi;
use botmend::util::{canonical_webhook_url, mask_secret};
use botmend::{artifact, openai};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

/// Diagnose and repair the wiring between a Telegram bot, its edge
/// worker, and the model API.
#[derive(Parser, Debug)]
#[command(name = "botmend")]
#[command(version)]
#[command(about = "Diagnose and repair bot/worker/model-API wiring.", long_about = None)]
struct Cli {
    /// Flat KEY=VALUE configuration file
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full diagnostic pipeline
    Doctor {
        /// Prompt for missing configuration instead of recording issues
        #[arg(long)]
        interactive: bool,

        /// Apply remediation automatically (interactive runs confirm first)
        #[arg(long)]
        fix: bool,

        /// Skip writing remediation artifacts
        #[arg(long)]
        no_artifacts: bool,
    },

    /// Inspect or repair the platform webhook
    Webhook {
        #[command(subcommand)]
        webhook_command: WebhookCommands,
    },

    /// Send a diagnostic test message to the configured chat
    SendTest {
        /// Message text (defaults to a fixed diagnostic text)
        #[arg(long)]
        text: Option<String>,
    },

    /// One-shot model completion, end-to-end smoke test of the model API
    Ask {
        /// The prompt to send
        message: String,

        /// Model to use
        #[arg(long, default_value = openai::DEFAULT_MODEL)]
        model: String,
    },

    /// Write remediation artifacts without running any checks
    Emit {
        #[command(subcommand)]
        emit_command: EmitCommands,
    },
}

#[derive(Subcommand, Debug)]
enum WebhookCommands {
    /// Show the registered webhook and any recorded delivery error
    Show,
    /// Point the webhook at a URL (defaults to the canonical target)
    Set {
        /// Target URL; the canonical /webhook suffix is appended if absent
        url: Option<String>,
    },
    /// Remove the registered webhook
    Clear,
    /// Discard the pending update backlog
    Drain,
}

#[derive(Subcommand, Debug)]
enum EmitCommands {
    /// Remediation shell script
    FixScript {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Reference worker implementation (three-route HTTP contract)
    WorkerTemplate {
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG, defaults to info.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Doctor {
            interactive,
            fix,
            no_artifacts,
        } => {
            let resolution = if interactive {
                // dialoguer prompts block, so resolution runs off the
                // async runtime's worker threads.
                let env_file = cli.env_file.clone();
                tokio::task::spawn_blocking(move || {
                    let file = EnvFile::load(&env_file);
                    config::resolve(&[&file, &config::ProcessEnv, &config::Prompt])
                })
                .await
                .map_err(|e| anyhow!("configuration resolution failed: {e}"))?
            } else {
                resolve(&cli.env_file)
            };

            let opts = DoctorOptions {
                fix: match (fix, interactive) {
                    (true, _) => FixMode::Auto,
                    (false, true) => FixMode::Ask,
                    (false, false) => FixMode::Never,
                },
                liveness: !interactive,
                artifact_dir: (!no_artifacts).then(|| PathBuf::from(".")),
                ..DoctorOptions::default()
            };

            doctor::run(&resolution, &opts).await;
            // Exit 0 regardless of findings; the summary is the output.
            Ok(())
        }

        Commands::Webhook { webhook_command } => {
            let settings = resolve(&cli.env_file).settings;
            let api = telegram_api(&settings)?;
            match webhook_command {
                WebhookCommands::Show => {
                    let info = api.get_webhook_info().await?;
                    if info.url.is_empty() {
                        println!("❌ no webhook configured");
                    } else {
                        println!("✅ webhook: {}", info.url);
                        if info.pending_update_count > 0 {
                            println!("   pending updates: {}", info.pending_update_count);
                        }
                        if let Some(message) = &info.last_error_message {
                            println!("   last error: {message}");
                        }
                    }
                    Ok(())
                }
                WebhookCommands::Set { url } => {
                    let target = match url {
                        Some(url) => canonical_webhook_url(&url),
                        None => settings.webhook_target().ok_or_else(|| {
                            anyhow!("no URL given and no WORKER_URL/WEBHOOK_URL configured")
                        })?,
                    };
                    let action = RemediationAction::SetWebhook { url: target };
                    print_outcome(&checks::apply_remediation(&api, &action).await);
                    Ok(())
                }
                WebhookCommands::Clear => {
                    api.delete_webhook().await?;
                    println!("✅ webhook cleared");
                    Ok(())
                }
                WebhookCommands::Drain => {
                    let action = RemediationAction::DrainBacklog;
                    print_outcome(&checks::apply_remediation(&api, &action).await);
                    Ok(())
                }
            }
        }

        Commands::SendTest { text } => {
            let settings = resolve(&cli.env_file).settings;
            let api = telegram_api(&settings)?;
            let chat_id = require(&settings, ConfigKey::ChatId)?;
            match text {
                Some(text) => {
                    api.send_message(&chat_id, &text, false).await?;
                    println!("✅ message sent to chat {chat_id}");
                }
                None => print_outcome(&checks::check_delivery(&api, &chat_id).await),
            }
            Ok(())
        }

        Commands::Ask { message, model } => {
            let settings = resolve(&cli.env_file).settings;
            let api_key = require(&settings, ConfigKey::ModelApiKey)?;
            tracing::debug!("asking {model} with key {}", mask_secret(&api_key));
            let client = openai::OpenAiClient::new(api_key);
            let answer = client.complete(None, &message, &model).await?;
            println!("{answer}");
            Ok(())
        }

        Commands::Emit { emit_command } => {
            match emit_command {
                EmitCommands::FixScript { out } => {
                    let settings = resolve(&cli.env_file).settings;
                    if let Some(path) = artifact::emit_fix_script(&out, &settings) {
                        println!("✅ wrote {}", path.display());
                    }
                }
                EmitCommands::WorkerTemplate { out } => {
                    if let Some(path) = artifact::emit_worker_template(&out) {
                        println!("✅ wrote {}", path.display());
                    }
                }
            }
            Ok(())
        }
    }
}

fn resolve(env_file: &Path) -> Resolution {
    let file = EnvFile::load(env_file);
    config::resolve(&[&file, &config::ProcessEnv])
}

fn telegram_api(settings: &Settings) -> Result<TelegramApi> {
    let token = require(settings, ConfigKey::BotToken)?;
    Ok(TelegramApi::new(token))
}

fn require(settings: &Settings, key: ConfigKey) -> Result<String> {
    settings
        .get(key)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("{key} is not configured"))
}

fn print_outcome(result: &checks::CheckResult) {
    if result.success {
        match &result.detail {
            Some(detail) => println!("✅ {detail}"),
            None => println!("✅ ok"),
        }
    } else {
        for issue in &result.issues {
            println!("❌ {issue}");
        }
    }
}
