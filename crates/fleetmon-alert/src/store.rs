//! Alert lifecycle state machine over the persistence collaborator.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AlertError, Result};
use fleetmon_common::types::{Alert, AlertRule, AlertStatus};
use fleetmon_storage::AlertRepository;

/// Owns alert state transitions and the open-alert deduplication
/// invariant: at most one alert with status `triggered` or `acknowledged`
/// exists per `(rule_id, host_id)` pair.
///
/// Every read-modify-write runs under a single coarse lock so concurrent
/// evaluation passes cannot double-open the same pair. Lookups that do not
/// mutate (`get`) go straight to the repository.
pub struct AlertStore {
    repo: Arc<dyn AlertRepository>,
    op_lock: Mutex<()>,
}

impl AlertStore {
    pub fn new(repo: Arc<dyn AlertRepository>) -> Self {
        Self {
            repo,
            op_lock: Mutex::new(()),
        }
    }

    pub async fn get(&self, alert_id: &str) -> Result<Option<Alert>> {
        Ok(self.repo.get_alert(alert_id).await?)
    }

    pub async fn list_open(&self) -> Result<Vec<Alert>> {
        Ok(self.repo.list_open_alerts().await?)
    }

    /// Alerts opened at or after `from`, for statistics.
    pub async fn list_since(&self, from: DateTime<Utc>) -> Result<Vec<Alert>> {
        Ok(self.repo.list_alerts_since(from).await?)
    }

    /// Records a qualifying observation for `(rule, host_id)`.
    ///
    /// If an open alert already exists the observation refreshes
    /// `last_seen_at`, `value_observed`, and `message`, and the returned
    /// flag is false. Otherwise a fresh `triggered` alert is created and
    /// the flag is true — only that case is notification-eligible.
    pub async fn open_or_refresh(
        &self,
        rule: &AlertRule,
        host_id: &str,
        value: f64,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<(Alert, bool)> {
        let _guard = self.op_lock.lock().await;

        if let Some(mut alert) = self.repo.find_open_alert(&rule.id, host_id).await? {
            alert.last_seen_at = now;
            alert.value_observed = value;
            alert.message = message;
            self.repo.update_alert(&alert).await?;
            tracing::debug!(
                alert_id = %alert.id,
                rule_id = %rule.id,
                host_id = %host_id,
                "Alert refreshed"
            );
            return Ok((alert, false));
        }

        let alert = Alert {
            id: fleetmon_common::id::next_id(),
            rule_id: rule.id.clone(),
            host_id: host_id.to_string(),
            severity: rule.severity,
            status: AlertStatus::Triggered,
            value_observed: value,
            message,
            opened_at: now,
            last_seen_at: now,
            acknowledged_at: None,
            resolved_at: None,
        };
        self.repo.insert_alert(&alert).await?;
        tracing::info!(
            alert_id = %alert.id,
            rule_id = %rule.id,
            host_id = %host_id,
            severity = %alert.severity,
            "Alert opened"
        );
        Ok((alert, true))
    }

    /// Marks a `triggered` alert as seen by an operator.
    pub async fn acknowledge(&self, alert_id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let _guard = self.op_lock.lock().await;

        let mut alert = self.fetch(alert_id).await?;
        if alert.status != AlertStatus::Triggered {
            return Err(AlertError::InvalidTransition {
                alert_id: alert_id.to_string(),
                from: alert.status,
                action: "acknowledge",
            });
        }
        alert.status = AlertStatus::Acknowledged;
        alert.acknowledged_at = Some(now);
        self.repo.update_alert(&alert).await?;
        tracing::info!(alert_id = %alert.id, "Alert acknowledged");
        Ok(alert)
    }

    /// Closes an open alert. Valid from `triggered` or `acknowledged`;
    /// a recurrence later opens a fresh alert rather than reviving this one.
    pub async fn resolve(&self, alert_id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let _guard = self.op_lock.lock().await;

        let mut alert = self.fetch(alert_id).await?;
        if !alert.status.is_open() {
            return Err(AlertError::InvalidTransition {
                alert_id: alert_id.to_string(),
                from: alert.status,
                action: "resolve",
            });
        }
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(now);
        self.repo.update_alert(&alert).await?;
        tracing::info!(alert_id = %alert.id, "Alert resolved");
        Ok(alert)
    }

    /// Auto-resolves open alerts that have not seen a qualifying
    /// observation within `max_silence`. This is how alerts self-heal when
    /// the condition simply stops occurring.
    pub async fn resolve_stale(
        &self,
        max_silence: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>> {
        let _guard = self.op_lock.lock().await;

        let cutoff = now - max_silence;
        let mut resolved = Vec::new();
        for mut alert in self.repo.list_open_alerts().await? {
            if alert.last_seen_at >= cutoff {
                continue;
            }
            alert.status = AlertStatus::Resolved;
            alert.resolved_at = Some(now);
            self.repo.update_alert(&alert).await?;
            tracing::info!(
                alert_id = %alert.id,
                rule_id = %alert.rule_id,
                host_id = %alert.host_id,
                last_seen = %alert.last_seen_at,
                "Alert auto-resolved (stale)"
            );
            resolved.push(alert);
        }
        Ok(resolved)
    }

    async fn fetch(&self, alert_id: &str) -> Result<Alert> {
        self.repo
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| AlertError::NotFound {
                entity: "alert",
                id: alert_id.to_string(),
            })
    }
}
