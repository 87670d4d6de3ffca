use crate::channels;
use crate::dispatcher::ChannelDispatcher;
use crate::router::NotificationRouter;
use crate::NotificationMessage;
use chrono::Utc;
use fleetmon_common::types::{
    Alert, AlertRule, AlertStatus, ChannelKind, ChannelSpec, CompareOp, RuleKind, Severity,
};
use fleetmon_storage::memory::MemoryStore;
use fleetmon_storage::ChannelRepository;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spec(id: &str, kind: ChannelKind, config: serde_json::Value) -> ChannelSpec {
    let now = Utc::now();
    ChannelSpec {
        id: id.to_string(),
        name: format!("channel {id}"),
        kind,
        config,
        enabled: true,
        min_severity: Severity::Info,
        created_at: now,
        updated_at: now,
    }
}

fn message(severity: Severity) -> NotificationMessage {
    NotificationMessage {
        alert_id: "a-1".into(),
        rule_name: "cpu high".into(),
        host_id: "h-1".into(),
        severity,
        value_observed: 92.5,
        opened_at: Utc::now(),
        message: "cpu.usage is above 85.0 on h-1 (observed 92.50)".into(),
    }
}

fn alert(severity: Severity) -> Alert {
    let now = Utc::now();
    Alert {
        id: "a-1".into(),
        rule_id: "r-1".into(),
        host_id: "h-1".into(),
        severity,
        status: AlertStatus::Triggered,
        value_observed: 92.5,
        message: "cpu high".into(),
        opened_at: now,
        last_seen_at: now,
        acknowledged_at: None,
        resolved_at: None,
    }
}

fn rule_with_channels(channel_ids: &[&str]) -> AlertRule {
    let now = Utc::now();
    AlertRule {
        id: "r-1".into(),
        name: "cpu high".into(),
        description: None,
        kind: RuleKind::Threshold,
        metric_name: Some("cpu.usage".into()),
        host_id: None,
        condition: Some(CompareOp::Gt),
        threshold: Some(85.0),
        severity: Severity::Warning,
        enabled: true,
        channel_ids: channel_ids.iter().map(|s| s.to_string()).collect(),
        cooldown_minutes: 0,
        created_at: now,
        updated_at: now,
    }
}

// ---- channel construction / config validation ----

#[tokio::test]
async fn build_validates_email_config() {
    let valid = spec(
        "c-1",
        ChannelKind::Email,
        serde_json::json!({
            "smtp_host": "smtp.example.com",
            "smtp_port": 587,
            "smtp_user": "mailer",
            "smtp_password": "s3cret",
            "from_email": "fleetmon@example.com",
            "to_emails": ["ops@example.com"],
            "use_tls": false
        }),
    );
    assert!(channels::build(&valid).is_ok());

    let missing_host = spec("c-2", ChannelKind::Email, serde_json::json!({}));
    assert!(channels::build(&missing_host).is_err());

    let empty_recipients = spec(
        "c-3",
        ChannelKind::Email,
        serde_json::json!({
            "smtp_host": "smtp.example.com",
            "from_email": "fleetmon@example.com",
            "to_emails": []
        }),
    );
    let err = channels::build(&empty_recipients).err().unwrap();
    assert!(err.to_string().contains("to_emails"), "err: {err}");
}

#[test]
fn build_validates_webhook_config() {
    let valid = spec(
        "c-1",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/x"}),
    );
    assert!(channels::build(&valid).is_ok());

    let put = spec(
        "c-2",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/x", "method": "PUT"}),
    );
    assert!(channels::build(&put).is_ok());

    let bad_method = spec(
        "c-3",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/x", "method": "DELETE"}),
    );
    let err = channels::build(&bad_method).err().unwrap();
    assert!(err.to_string().contains("unsupported method"), "err: {err}");

    let missing_url = spec("c-4", ChannelKind::Webhook, serde_json::json!({}));
    assert!(channels::build(&missing_url).is_err());
}

#[test]
fn build_validates_chat_webhook_configs() {
    for kind in [ChannelKind::Slack, ChannelKind::Discord] {
        let valid = spec(
            "c-1",
            kind,
            serde_json::json!({"webhook_url": "https://chat.example.com/hook"}),
        );
        assert!(channels::build(&valid).is_ok());

        let invalid = spec("c-2", kind, serde_json::json!({}));
        assert!(channels::build(&invalid).is_err());
    }
}

// ---- router ----

#[tokio::test]
async fn router_filters_by_severity() {
    let store = Arc::new(MemoryStore::new());
    let mut warn_only = spec(
        "c-warn",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/a"}),
    );
    warn_only.min_severity = Severity::Warning;
    store.insert_channel(&warn_only).await.unwrap();

    let router = NotificationRouter::new(store);
    let rule = rule_with_channels(&["c-warn"]);

    let for_info = router.route(&alert(Severity::Info), &rule).await.unwrap();
    assert!(for_info.is_empty());

    let for_warning = router
        .route(&alert(Severity::Warning), &rule)
        .await
        .unwrap();
    assert_eq!(for_warning.len(), 1);

    let for_critical = router
        .route(&alert(Severity::Critical), &rule)
        .await
        .unwrap();
    assert_eq!(for_critical.len(), 1);
}

#[tokio::test]
async fn router_dedups_and_skips_disabled_and_unknown() {
    let store = Arc::new(MemoryStore::new());
    let a = spec(
        "c-a",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/a"}),
    );
    let mut b = spec(
        "c-b",
        ChannelKind::Webhook,
        serde_json::json!({"url": "https://hooks.example.com/b"}),
    );
    b.enabled = false;
    store.insert_channel(&a).await.unwrap();
    store.insert_channel(&b).await.unwrap();

    let router = NotificationRouter::new(store);
    // c-a referenced twice, c-b disabled, c-ghost missing
    let rule = rule_with_channels(&["c-a", "c-b", "c-a", "c-ghost"]);

    let resolved = router
        .route(&alert(Severity::Warning), &rule)
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, "c-a");
}

// ---- dispatcher ----

#[tokio::test]
async fn dispatch_isolates_per_channel_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ok-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ok-2"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let specs = vec![
        spec(
            "c-1",
            ChannelKind::Webhook,
            serde_json::json!({"url": format!("{}/ok-1", server.uri())}),
        ),
        spec(
            "c-2",
            ChannelKind::Webhook,
            serde_json::json!({"url": format!("{}/fail", server.uri())}),
        ),
        spec(
            "c-3",
            ChannelKind::Webhook,
            serde_json::json!({"url": format!("{}/ok-2", server.uri())}),
        ),
    ];

    let dispatcher = ChannelDispatcher::new(5, Duration::from_secs(5));
    let results = dispatcher.dispatch(&message(Severity::Warning), &specs).await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.channel_id.as_str()).collect::<Vec<_>>(),
        vec!["c-1", "c-2", "c-3"]
    );
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[2].success);
    let err = results[1].error.as_deref().unwrap();
    assert!(err.contains("500"), "err: {err}");
}

#[tokio::test]
async fn dispatch_times_out_slow_channels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let specs = vec![spec(
        "c-slow",
        ChannelKind::Webhook,
        serde_json::json!({"url": format!("{}/hook", server.uri())}),
    )];

    let dispatcher = ChannelDispatcher::new(5, Duration::from_millis(100));
    let results = dispatcher.dispatch(&message(Severity::Critical), &specs).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(
        results[0].error.as_deref().unwrap().contains("timed out"),
        "err: {:?}",
        results[0].error
    );
}

#[tokio::test]
async fn dispatch_reports_unbuildable_channels() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let specs = vec![
        spec(
            "c-bad",
            ChannelKind::Webhook,
            serde_json::json!({"url": format!("{}/hook", server.uri()), "method": "DELETE"}),
        ),
        spec(
            "c-good",
            ChannelKind::Webhook,
            serde_json::json!({"url": format!("{}/hook", server.uri())}),
        ),
    ];

    let dispatcher = ChannelDispatcher::new(5, Duration::from_secs(5));
    let results = dispatcher.dispatch(&message(Severity::Info), &specs).await;

    assert_eq!(results.len(), 2);
    assert!(!results[0].success);
    assert!(results[1].success);
}

#[tokio::test]
async fn invalidate_rebuilds_channel_from_new_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = ChannelDispatcher::new(5, Duration::from_secs(5));
    let old = spec(
        "c-1",
        ChannelKind::Webhook,
        serde_json::json!({"url": format!("{}/old", server.uri())}),
    );
    let mut new = old.clone();
    new.config = serde_json::json!({"url": format!("{}/new", server.uri())});

    let msg = message(Severity::Info);
    assert!(dispatcher.dispatch(&msg, std::slice::from_ref(&old)).await[0].success);

    // Same id: the cached instance still points at the old URL
    assert!(dispatcher.dispatch(&msg, std::slice::from_ref(&new)).await[0].success);

    dispatcher.invalidate("c-1").await;
    assert!(dispatcher.dispatch(&msg, std::slice::from_ref(&new)).await[0].success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.url.path() == "/old").count(), 2);
    assert_eq!(requests.iter().filter(|r| r.url.path() == "/new").count(), 1);
}

#[tokio::test]
async fn webhook_channel_sends_method_headers_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/ingest"))
        .and(header("x-api-key", "k-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let specs = vec![spec(
        "c-1",
        ChannelKind::Webhook,
        serde_json::json!({
            "url": format!("{}/ingest", server.uri()),
            "method": "PUT",
            "headers": {"x-api-key": "k-123"}
        }),
    )];

    let dispatcher = ChannelDispatcher::new(5, Duration::from_secs(5));
    let results = dispatcher.dispatch(&message(Severity::Warning), &specs).await;
    assert!(results[0].success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["rule_name"], "cpu high");
    assert_eq!(body["host_id"], "h-1");
    assert_eq!(body["severity"], "warning");
    assert_eq!(body["value_observed"], 92.5);
}

#[tokio::test]
async fn slack_and_discord_render_native_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let specs = vec![
        spec(
            "c-slack",
            ChannelKind::Slack,
            serde_json::json!({"webhook_url": format!("{}/slack", server.uri())}),
        ),
        spec(
            "c-discord",
            ChannelKind::Discord,
            serde_json::json!({"webhook_url": format!("{}/discord", server.uri())}),
        ),
    ];

    let dispatcher = ChannelDispatcher::new(5, Duration::from_secs(5));
    let results = dispatcher
        .dispatch(&message(Severity::Critical), &specs)
        .await;
    assert!(results.iter().all(|r| r.success));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let slack_req = requests
        .iter()
        .find(|r| r.url.path() == "/slack")
        .expect("slack request");
    let slack_body: serde_json::Value = slack_req.body_json().unwrap();
    assert_eq!(slack_body["attachments"][0]["color"], "danger");
    assert!(slack_body["attachments"][0]["title"]
        .as_str()
        .unwrap()
        .contains("cpu high"));

    let discord_req = requests
        .iter()
        .find(|r| r.url.path() == "/discord")
        .expect("discord request");
    let discord_body: serde_json::Value = discord_req.body_json().unwrap();
    assert_eq!(discord_body["embeds"][0]["color"], 0xe74c3c);
    assert_eq!(discord_body["embeds"][0]["fields"][0]["value"], "h-1");
}
