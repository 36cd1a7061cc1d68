//! Generated remediation artifacts: a shell script that replays the
//! webhook repair sequence, and a reference worker implementing the
//! three-route HTTP contract. Rendering is plain template substitution;
//! the output is never validated, and a failed write is a one-shot
//! warning, not a pipeline failure.

use crate::config::Settings;
use crate::liveness::DEFAULT_PROCESS_PATTERNS;
use std::path::{Path, PathBuf};

pub const FIX_SCRIPT_NAME: &str = "botmend-fix.sh";
pub const WORKER_TEMPLATE_NAME: &str = "worker-template.js";

/// The shell script re-exports the resolved configuration and reissues
/// the webhook-clear/webhook-set/process-restart sequence.
pub fn render_fix_script(settings: &Settings) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let bot_token = settings.bot_token.as_deref().unwrap_or("YOUR_BOT_TOKEN");
    let api_key = settings.model_api_key.as_deref().unwrap_or("YOUR_OPENAI_KEY");
    let chat_id = settings.chat_id.as_deref().unwrap_or("YOUR_CHAT_ID");
    let webhook_url = settings
        .webhook_target()
        .unwrap_or_else(|| "https://your-bot.workers.dev/webhook".to_string());

    let patterns: Vec<String> = if settings.process_patterns.is_empty() {
        DEFAULT_PROCESS_PATTERNS
            .iter()
            .map(ToString::to_string)
            .collect()
    } else {
        settings.process_patterns.clone()
    };

    let kill_lines = patterns
        .iter()
        .map(|p| format!("pkill -f \"{p}\" 2>/dev/null"))
        .collect::<Vec<_>>()
        .join("\n");

    let restart_line = match patterns.first() {
        Some(entry) if entry.ends_with(".py") => {
            format!("nohup python3 {entry} > bot.log 2>&1 &\necho \"Bot restarted; check bot.log\"")
        }
        _ => "echo \"Start the bot with your service manager (e.g. systemctl restart bot)\""
            .to_string(),
    };

    format!(
        r#"#!/bin/bash
# Bot wiring fix script, generated by botmend
# Generated: {timestamp}

echo "Starting bot fix process..."

# Resolved configuration
export TELEGRAM_BOT_TOKEN="{bot_token}"
export OPENAI_API_KEY="{api_key}"
export TELEGRAM_CHAT_ID="{chat_id}"
export WEBHOOK_URL="{webhook_url}"

echo "Stopping existing bot process..."
{kill_lines}

echo "Clearing webhook..."
curl -s "https://api.telegram.org/bot$TELEGRAM_BOT_TOKEN/deleteWebhook"

echo "Setting webhook..."
curl -s "https://api.telegram.org/bot$TELEGRAM_BOT_TOKEN/setWebhook" \
    -d "url=$WEBHOOK_URL"

echo "Restarting bot..."
{restart_line}

echo "Fix process completed."
"#
    )
}

/// Reference worker: webhook POST route, health GET route, catch-all.
/// The secrets stay out of the template; the platform injects them as
/// environment bindings.
pub fn render_worker_template() -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"// Worker for a Telegram bot backed by an OpenAI-compatible model.
// Generated by botmend on {timestamp}.
// Requires TELEGRAM_BOT_TOKEN and OPENAI_API_KEY environment bindings.

addEventListener('fetch', event => {{
  event.respondWith(handleRequest(event.request))
}})

async function handleRequest(request) {{
  const url = new URL(request.url)

  // Updates pushed by the messaging platform
  if (request.method === 'POST' && url.pathname === '/webhook') {{
    const update = await request.json()
    if (update.message) {{
      await processMessage(update.message)
    }}
    return new Response('OK', {{ status: 200 }})
  }}

  if (url.pathname === '/health') {{
    return new Response(JSON.stringify({{
      status: 'healthy',
      timestamp: new Date().toISOString()
    }}), {{
      headers: {{ 'Content-Type': 'application/json' }}
    }})
  }}

  return new Response('Bot is running', {{ status: 200 }})
}}

async function processMessage(message) {{
  const chatId = message.chat.id
  const text = message.text
  const aiResponse = await getModelResponse(text)
  await sendTelegramMessage(chatId, aiResponse)
}}

async function getModelResponse(prompt) {{
  const response = await fetch('https://api.openai.com/v1/chat/completions', {{
    method: 'POST',
    headers: {{
      'Authorization': `Bearer ${{OPENAI_API_KEY}}`,
      'Content-Type': 'application/json'
    }},
    body: JSON.stringify({{
      model: 'gpt-3.5-turbo',
      messages: [
        {{ role: 'system', content: 'You are the operations assistant for this website.' }},
        {{ role: 'user', content: prompt }}
      ],
      max_tokens: 500
    }})
  }})

  const data = await response.json()
  return data.choices[0].message.content
}}

async function sendTelegramMessage(chatId, text) {{
  const url = `https://api.telegram.org/bot${{TELEGRAM_BOT_TOKEN}}/sendMessage`
  await fetch(url, {{
    method: 'POST',
    headers: {{ 'Content-Type': 'application/json' }},
    body: JSON.stringify({{
      chat_id: chatId,
      text: text,
      parse_mode: 'Markdown'
    }})
  }})
}}
"#
    )
}

pub fn emit_fix_script(dir: &Path, settings: &Settings) -> Option<PathBuf> {
    let path = dir.join(FIX_SCRIPT_NAME);
    if write_artifact(&path, &render_fix_script(settings)) {
        set_executable(&path);
        Some(path)
    } else {
        None
    }
}

pub fn emit_worker_template(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(WORKER_TEMPLATE_NAME);
    if write_artifact(&path, &render_worker_template()) {
        Some(path)
    } else {
        None
    }
}

fn write_artifact(path: &Path, contents: &str) -> bool {
    match std::fs::write(path, contents) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("could not write {}: {e}", path.display());
            println!("  ⚠️  could not write {}: {e}", path.display());
            false
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
        tracing::warn!("could not mark {} executable: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) {}
