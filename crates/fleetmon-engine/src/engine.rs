//! The evaluation pass and the operator surface.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::source::MetricSource;
use crate::summary::{self, AlertSummary};
use fleetmon_alert::cooldown::CooldownTracker;
use fleetmon_alert::evaluator::{self, EvaluationOutcome, RuleInput};
use fleetmon_alert::mute::MuteRegistry;
use fleetmon_alert::rule;
use fleetmon_alert::store::AlertStore;
use fleetmon_common::types::{
    Alert, AlertMute, AlertRule, ChannelSpec, HostStatus, MetricReading, RuleKind,
};
use fleetmon_notify::dispatcher::ChannelDispatcher;
use fleetmon_notify::router::NotificationRouter;
use fleetmon_notify::{channels, DispatchResult, NotificationMessage};
use fleetmon_storage::{AlertRepository, ChannelRepository, MuteRepository, RuleRepository};

/// What one `evaluate_all` pass did.
#[derive(Debug)]
pub struct EvaluationReport {
    pub started_at: DateTime<Utc>,
    /// Alerts newly opened this pass (muted or cooled-down ones included).
    pub fired: Vec<Alert>,
    /// Qualifying observations that refreshed an already-open alert.
    pub refreshed: u64,
    /// Open alerts auto-resolved for staleness at the start of the pass.
    pub auto_resolved: Vec<Alert>,
    pub suppressed_muted: u64,
    pub suppressed_cooldown: u64,
    /// Rules whose evaluation failed; the pass continued without them.
    pub rule_errors: u64,
    pub dispatches: Vec<DispatchResult>,
}

impl EvaluationReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            fired: Vec::new(),
            refreshed: 0,
            auto_resolved: Vec::new(),
            suppressed_muted: 0,
            suppressed_cooldown: 0,
            rule_errors: 0,
            dispatches: Vec::new(),
        }
    }
}

/// Ties the rule catalog, metric source, alert lifecycle, gating, and
/// dispatch together.
///
/// Shared mutable state (alert store, cooldowns, mutes, host status
/// memory) sits behind narrow locks, so `evaluate_all` may be called
/// concurrently with operator actions without corrupting the dedup
/// invariant.
pub struct MonitorEngine {
    rules: Arc<dyn RuleRepository>,
    channels: Arc<dyn ChannelRepository>,
    source: Arc<dyn MetricSource>,
    store: AlertStore,
    cooldowns: CooldownTracker,
    mutes: MuteRegistry,
    router: NotificationRouter,
    dispatcher: Arc<ChannelDispatcher>,
    /// Host reachability seen by the previous pass, for status-change
    /// rules.
    last_status: Mutex<HashMap<String, HostStatus>>,
    stale_after: Duration,
}

impl MonitorEngine {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        alerts: Arc<dyn AlertRepository>,
        channels: Arc<dyn ChannelRepository>,
        mutes: Arc<dyn MuteRepository>,
        source: Arc<dyn MetricSource>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            rules,
            channels: channels.clone(),
            source,
            store: AlertStore::new(alerts),
            cooldowns: CooldownTracker::new(),
            mutes: MuteRegistry::new(mutes),
            router: NotificationRouter::new(channels),
            dispatcher: Arc::new(ChannelDispatcher::new(
                config.dispatch_concurrency,
                std::time::Duration::from_secs(config.dispatch_timeout_secs),
            )),
            last_status: Mutex::new(HashMap::new()),
            stale_after: Duration::seconds(config.stale_after_secs as i64),
        }
    }

    /// Runs one evaluation pass over every enabled rule.
    ///
    /// Alert creation happens before routing, routing before dispatch,
    /// and all dispatch happens after the evaluation loop, so a slow
    /// channel never delays evaluation of unrelated rules. Per-rule
    /// failures are logged and counted without aborting the pass.
    pub async fn evaluate_all(&self) -> Result<EvaluationReport> {
        let now = Utc::now();
        let mut report = EvaluationReport::new(now);

        if let Err(e) = self.mutes.prune_expired(now).await {
            tracing::warn!(error = %e, "Failed to prune expired mutes");
        }

        match self.store.resolve_stale(self.stale_after, now).await {
            Ok(resolved) => report.auto_resolved = resolved,
            Err(e) => tracing::warn!(error = %e, "Stale-alert resolution failed"),
        }

        let rules = self.rules.list_enabled_rules().await?;
        let hosts = self.source.host_ids().await?;

        // Poll statuses once per pass; every status rule sees the same
        // snapshot, compared against the previous pass's snapshot.
        let previous_status = self.last_status.lock().unwrap().clone();
        let mut current_status: HashMap<String, HostStatus> = HashMap::new();
        if rules.iter().any(|r| r.kind == RuleKind::StatusChange) {
            for host in &hosts {
                match self.source.latest_status(host).await {
                    Ok(status) => {
                        current_status.insert(host.clone(), status);
                    }
                    Err(e) => {
                        tracing::warn!(host_id = %host, error = %e, "Failed to poll host status");
                    }
                }
            }
        }

        // Readings polled at most once per (host, metric) per pass.
        let mut readings: HashMap<(String, String), Option<MetricReading>> = HashMap::new();
        let mut outbox: Vec<(NotificationMessage, Vec<ChannelSpec>)> = Vec::new();

        for rule in &rules {
            if let Err(e) = self
                .evaluate_rule(
                    rule,
                    &hosts,
                    &previous_status,
                    &current_status,
                    &mut readings,
                    &mut outbox,
                    &mut report,
                    now,
                )
                .await
            {
                report.rule_errors += 1;
                tracing::error!(rule_id = %rule.id, error = %e, "Rule evaluation failed");
            }
        }

        if !current_status.is_empty() {
            self.last_status.lock().unwrap().extend(current_status);
        }

        // Dispatch phase: all alerts fan out concurrently, bounded by the
        // dispatcher's semaphore and per-send timeout.
        let mut handles = Vec::new();
        for (message, specs) in outbox {
            let dispatcher = self.dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.dispatch(&message, &specs).await
            }));
        }
        for handle in handles {
            match handle.await {
                Ok(results) => report.dispatches.extend(results),
                Err(e) => tracing::error!(error = %e, "Dispatch task failed"),
            }
        }

        tracing::debug!(
            fired = report.fired.len(),
            refreshed = report.refreshed,
            auto_resolved = report.auto_resolved.len(),
            muted = report.suppressed_muted,
            cooldown = report.suppressed_cooldown,
            rule_errors = report.rule_errors,
            dispatches = report.dispatches.len(),
            "Evaluation pass finished"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    async fn evaluate_rule(
        &self,
        rule: &AlertRule,
        hosts: &[String],
        previous_status: &HashMap<String, HostStatus>,
        current_status: &HashMap<String, HostStatus>,
        readings: &mut HashMap<(String, String), Option<MetricReading>>,
        outbox: &mut Vec<(NotificationMessage, Vec<ChannelSpec>)>,
        report: &mut EvaluationReport,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let targets: Vec<&str> = match &rule.host_id {
            Some(host) => vec![host.as_str()],
            None => hosts.iter().map(|h| h.as_str()).collect(),
        };

        for host in targets {
            let input = match rule.kind {
                RuleKind::Threshold => {
                    let Some(metric) = rule.metric_name.as_deref() else {
                        return Err(fleetmon_alert::error::AlertError::InvalidRule(
                            "threshold rule without metric_name".into(),
                        )
                        .into());
                    };
                    let key = (host.to_string(), metric.to_string());
                    if !readings.contains_key(&key) {
                        let polled = self.source.latest_reading(host, metric).await?;
                        readings.insert(key.clone(), polled);
                    }
                    match readings.get(&key).cloned().flatten() {
                        Some(reading) => RuleInput::Reading(reading),
                        None => continue,
                    }
                }
                RuleKind::StatusChange => {
                    let Some(current) = current_status.get(host).copied() else {
                        continue;
                    };
                    RuleInput::Status {
                        host_id: host.to_string(),
                        previous: previous_status.get(host).copied(),
                        current,
                    }
                }
            };

            let EvaluationOutcome::Fires { value, message } = evaluator::evaluate(rule, &input)?
            else {
                continue;
            };

            let (alert, is_new) = self
                .store
                .open_or_refresh(rule, host, value, message, now)
                .await?;
            if !is_new {
                report.refreshed += 1;
                continue;
            }
            report.fired.push(alert.clone());

            // Gating order matters: a muted alert must not consume the
            // cooldown window.
            if self.mutes.is_muted(&rule.id, host, now).await? {
                report.suppressed_muted += 1;
                tracing::info!(
                    alert_id = %alert.id,
                    rule_id = %rule.id,
                    host_id = %host,
                    "Notification suppressed (muted)"
                );
                continue;
            }
            if !self.cooldowns.should_notify(rule, host, now) {
                report.suppressed_cooldown += 1;
                tracing::info!(
                    alert_id = %alert.id,
                    rule_id = %rule.id,
                    host_id = %host,
                    "Notification suppressed (cooldown)"
                );
                continue;
            }

            let specs = self.router.route(&alert, rule).await?;
            if specs.is_empty() {
                tracing::debug!(
                    alert_id = %alert.id,
                    rule_id = %rule.id,
                    "No channels resolved, nothing to dispatch"
                );
                continue;
            }

            self.cooldowns.record_notified(&rule.id, host, now);
            outbox.push((
                NotificationMessage {
                    alert_id: alert.id.clone(),
                    rule_name: rule.name.clone(),
                    host_id: alert.host_id.clone(),
                    severity: alert.severity,
                    value_observed: alert.value_observed,
                    opened_at: alert.opened_at,
                    message: alert.message.clone(),
                },
                specs,
            ));
        }

        Ok(())
    }

    // ---- operator surface ----

    pub async fn acknowledge(&self, alert_id: &str) -> Result<Alert> {
        Ok(self.store.acknowledge(alert_id, Utc::now()).await?)
    }

    pub async fn resolve(&self, alert_id: &str) -> Result<Alert> {
        Ok(self.store.resolve(alert_id, Utc::now()).await?)
    }

    pub async fn open_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.store.list_open().await?)
    }

    pub async fn mute(
        &self,
        rule_id: Option<String>,
        host_id: Option<String>,
        reason: Option<String>,
        muted_by: &str,
        duration: Option<Duration>,
    ) -> Result<AlertMute> {
        Ok(self
            .mutes
            .mute(rule_id, host_id, reason, muted_by, duration, Utc::now())
            .await?)
    }

    pub async fn unmute(&self, mute_id: &str) -> Result<()> {
        Ok(self.mutes.unmute(mute_id).await?)
    }

    pub async fn list_mutes(&self) -> Result<Vec<AlertMute>> {
        Ok(self.mutes.list().await?)
    }

    /// Alert statistics for the trailing `window`.
    pub async fn summary(&self, window: Duration) -> Result<AlertSummary> {
        let to = Utc::now();
        let from = to - window;
        let alerts = self.store.list_since(from).await?;
        Ok(summary::summarize(&alerts, from, to))
    }

    // ---- rule management ----

    /// Validates and persists a rule. Malformed rules are rejected here so
    /// evaluation never sees them.
    pub async fn create_rule(&self, rule: AlertRule) -> Result<AlertRule> {
        rule::validate(&rule)?;
        self.rules.insert_rule(&rule).await?;
        tracing::info!(rule_id = %rule.id, name = %rule.name, "Alert rule created");
        Ok(rule)
    }

    pub async fn update_rule(&self, mut rule: AlertRule) -> Result<AlertRule> {
        rule::validate(&rule)?;
        rule.updated_at = Utc::now();
        self.rules.update_rule(&rule).await?;
        tracing::info!(rule_id = %rule.id, "Alert rule updated");
        Ok(rule)
    }

    pub async fn delete_rule(&self, rule_id: &str) -> Result<bool> {
        let deleted = self.rules.delete_rule(rule_id).await?;
        if deleted {
            self.cooldowns.clear_rule(rule_id);
            tracing::info!(rule_id = %rule_id, "Alert rule deleted");
        }
        Ok(deleted)
    }

    pub async fn list_rules(&self) -> Result<Vec<AlertRule>> {
        Ok(self.rules.list_rules().await?)
    }

    // ---- channel management ----

    /// Validates the channel config by constructing the concrete channel
    /// once, then persists the spec.
    pub async fn create_channel(&self, spec: ChannelSpec) -> Result<ChannelSpec> {
        channels::build(&spec)?;
        self.channels.insert_channel(&spec).await?;
        tracing::info!(channel_id = %spec.id, kind = %spec.kind, "Notification channel created");
        Ok(spec)
    }

    pub async fn update_channel(&self, mut spec: ChannelSpec) -> Result<ChannelSpec> {
        channels::build(&spec)?;
        spec.updated_at = Utc::now();
        self.channels.update_channel(&spec).await?;
        self.dispatcher.invalidate(&spec.id).await;
        tracing::info!(channel_id = %spec.id, "Notification channel updated");
        Ok(spec)
    }

    pub async fn delete_channel(&self, channel_id: &str) -> Result<bool> {
        let deleted = self.channels.delete_channel(channel_id).await?;
        if deleted {
            self.dispatcher.invalidate(channel_id).await;
            tracing::info!(channel_id = %channel_id, "Notification channel deleted");
        }
        Ok(deleted)
    }
}
