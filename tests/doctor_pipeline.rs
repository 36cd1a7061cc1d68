//! Pipeline-level tests against mock endpoints standing in for the
//! messaging platform, the worker, and the model API.

use botmend::config::{self, ConfigKey, Resolution, Source};
use botmend::doctor::{self, DoctorOptions, FixMode, Issue};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "TEST_TOKEN";

/// Configuration source backed by a literal list, so resolution (and its
/// URL normalization) runs exactly as in production.
struct TestSource(Vec<(&'static str, String)>);

impl Source for TestSource {
    fn name(&self) -> &'static str {
        "test"
    }

    fn lookup_var(&self, var: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(k, _)| *k == var)
            .map(|(_, v)| v.clone())
    }
}

fn resolve(pairs: Vec<(&'static str, String)>) -> Resolution {
    let source = TestSource(pairs);
    config::resolve(&[&source])
}

fn options(telegram: &MockServer, openai: &MockServer, fix: FixMode) -> DoctorOptions {
    DoctorOptions {
        fix,
        liveness: false,
        artifact_dir: None,
        telegram_api_base: Some(telegram.uri()),
        openai_api_base: Some(openai.uri()),
    }
}

async fn mock_get_me_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"id": 7, "username": "newsbot", "first_name": "News"}
        })))
        .mount(server)
        .await;
}

async fn mock_webhook_info(server: &MockServer, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getWebhookInfo")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true, "result": result})),
        )
        .mount(server)
        .await;
}

async fn mock_send_message_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": {"message_id": 1}
        })))
        .mount(server)
        .await;
}

async fn mock_models_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": "gpt-4o-mini"}, {"id": "gpt-3.5-turbo"}]
        })))
        .mount(server)
        .await;
}

async fn mock_worker_ok(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Bot is running"))
        .mount(server)
        .await;
}

/// A configuration missing the bot token halts before any HTTP call and
/// reports exactly one fatal issue.
#[tokio::test]
async fn missing_bot_token_is_fatal_and_makes_no_requests() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;

    let resolution = resolve(vec![]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert_eq!(
        report.issues,
        vec![Issue::MissingConfig {
            key: ConfigKey::BotToken
        }]
    );
    assert!(telegram.received_requests().await.unwrap().is_empty());
    assert!(openai.received_requests().await.unwrap().is_empty());
}

/// A 401 from the model listing records the invalid-key issue and fails
/// the check; nothing else about the run changes.
#[tokio::test]
async fn model_api_401_records_invalid_key() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({"url": format!("{}/webhook", worker.uri()), "pending_update_count": 0}),
    )
    .await;
    mock_worker_ok(&worker).await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&openai)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-bad".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Never)).await;

    assert!(report.issues.contains(&Issue::InvalidModelKey));
    assert!(
        report
            .statuses
            .iter()
            .any(|(name, ok)| *name == "Model API credential" && !ok)
    );
}

/// A healthy, fully-configured target yields zero issues and performs no
/// remediation, on the first run and on a second identical run.
#[tokio::test]
async fn healthy_target_is_idempotent() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({"url": format!("{}/webhook", worker.uri()), "pending_update_count": 0}),
    )
    .await;
    mock_send_message_ok(&telegram).await;
    mock_models_ok(&openai).await;
    mock_worker_ok(&worker).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;

    let pairs = vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("TELEGRAM_CHAT_ID", "42".to_string()),
        ("WEBHOOK_URL", format!("{}/webhook", worker.uri())),
        ("WORKER_URL", worker.uri()),
    ];

    for run in 0..2 {
        let resolution = resolve(pairs.clone());
        let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;
        assert!(
            report.healthy(),
            "run {run} found issues: {:?}",
            report.issues
        );
        assert!(report.fixes_applied.is_empty());
    }
}

/// An empty webhook URL triggers exactly one setWebhook attempt with the
/// canonical path: normalized scheme, single /webhook suffix.
#[tokio::test]
async fn missing_webhook_is_set_once_with_canonical_path() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(&telegram, serde_json::json!({"url": ""})).await;
    mock_models_ok(&openai).await;
    mock_worker_ok(&worker).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .and(body_partial_json(serde_json::json!({
            "url": "https://example.workers.dev/webhook"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true, "result": true})),
        )
        .expect(1)
        .mount(&telegram)
        .await;

    // Scheme-less on purpose: normalization must happen before any
    // request is issued.
    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WEBHOOK_URL", "example.workers.dev".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert!(report.issues.contains(&Issue::NoWebhook));
    assert_eq!(
        report.fixes_applied,
        vec!["set webhook to https://example.workers.dev/webhook".to_string()]
    );
}

/// A target already carrying the /webhook suffix gains no second one.
#[tokio::test]
async fn webhook_target_suffix_is_not_duplicated() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(&telegram, serde_json::json!({"url": ""})).await;
    mock_models_ok(&openai).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .and(body_partial_json(serde_json::json!({
            "url": "https://example.workers.dev/webhook"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true, "result": true})),
        )
        .expect(1)
        .mount(&telegram)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WEBHOOK_URL", "https://example.workers.dev/webhook".to_string()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert_eq!(
        report.fixes_applied,
        vec!["set webhook to https://example.workers.dev/webhook".to_string()]
    );
}

/// The platform's recorded delivery error surfaces verbatim, and
/// remediation neither clears nor re-sets anything.
#[tokio::test]
async fn webhook_delivery_error_is_surfaced_not_cleared() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({
            "url": format!("{}/webhook", worker.uri()),
            "pending_update_count": 5,
            "last_error_date": 1_700_000_000,
            "last_error_message": "Connection refused"
        }),
    )
    .await;
    mock_models_ok(&openai).await;
    mock_worker_ok(&worker).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/deleteWebhook")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert!(
        report
            .issues
            .iter()
            .any(|i| i.to_string() == "webhook error: Connection refused")
    );
    assert!(report.fixes_applied.is_empty());
}

/// A webhook pointing somewhere else entirely is a mismatch, non-fatal,
/// and does not trigger remediation.
#[tokio::test]
async fn webhook_mismatch_is_recorded_without_remediation() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({"url": "https://somewhere-else.example/webhook"}),
    )
    .await;
    mock_models_ok(&openai).await;
    mock_worker_ok(&worker).await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/setWebhook")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert!(
        report
            .issues
            .iter()
            .any(|i| matches!(i, Issue::WebhookMismatch { .. }))
    );
    assert!(
        report
            .statuses
            .iter()
            .any(|(name, ok)| *name == "Webhook" && *ok),
        "mismatch alone must not fail the webhook check"
    );
    assert!(report.fixes_applied.is_empty());
}

/// A 404 from the worker root classifies as wrong-path and selects the
/// routing-fix suggestion.
#[tokio::test]
async fn worker_404_selects_routing_suggestion() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({"url": format!("{}/webhook", worker.uri())}),
    )
    .await;
    mock_models_ok(&openai).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&worker)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Never)).await;

    assert!(
        report
            .issues
            .iter()
            .any(|i| matches!(i, Issue::EndpointWrongPath { .. }))
    );
    assert!(
        report
            .suggestions
            .iter()
            .any(|s| s.title == "Fix worker routes")
    );
}

/// An invalid token fails the credential check and the dependent webhook
/// and delivery checks are skipped rather than attempted.
#[tokio::test]
async fn invalid_token_skips_dependent_checks() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&telegram)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/getWebhookInfo")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&telegram)
        .await;
    mock_models_ok(&openai).await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("TELEGRAM_CHAT_ID", "42".to_string()),
    ]);
    let report = doctor::run(&resolution, &options(&telegram, &openai, FixMode::Auto)).await;

    assert!(
        report
            .issues
            .iter()
            .any(|i| matches!(i, Issue::InvalidBotToken { .. }))
    );
    assert!(
        report
            .statuses
            .iter()
            .any(|(name, ok)| *name == "Webhook" && !ok)
    );
}

/// With liveness enabled and a worker URL present, the health route gets
/// probed and a 200 marks the bot alive.
#[tokio::test]
async fn liveness_probes_worker_health_route() {
    let telegram = MockServer::start().await;
    let openai = MockServer::start().await;
    let worker = MockServer::start().await;

    mock_get_me_ok(&telegram).await;
    mock_webhook_info(
        &telegram,
        serde_json::json!({"url": format!("{}/webhook", worker.uri())}),
    )
    .await;
    mock_models_ok(&openai).await;
    mock_worker_ok(&worker).await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "healthy"})),
        )
        .expect(1)
        .mount(&worker)
        .await;

    let resolution = resolve(vec![
        ("TELEGRAM_BOT_TOKEN", TOKEN.to_string()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("WORKER_URL", worker.uri()),
    ]);
    let mut opts = options(&telegram, &openai, FixMode::Never);
    opts.liveness = true;
    let report = doctor::run(&resolution, &opts).await;

    assert!(
        report
            .statuses
            .iter()
            .any(|(name, ok)| *name == "Liveness" && *ok)
    );
}
