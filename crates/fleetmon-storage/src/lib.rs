//! Persistence interfaces for the monitoring core.
//!
//! The engine owns the *decisions* (deduplication, lifecycle transitions,
//! gating); these repositories own *durability*. Production deployments
//! back them with a database; [`memory::MemoryStore`] is the in-process
//! reference implementation used by tests and embedded setups.

pub mod error;
pub mod memory;


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error::Result;
use fleetmon_common::types::{Alert, AlertMute, AlertRule, ChannelSpec};

/// CRUD for alert rule definitions.
///
/// Implementations must be safe to share across tasks (`Send + Sync`):
/// the evaluation pass and the management surface access rules
/// concurrently.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn insert_rule(&self, rule: &AlertRule) -> Result<()>;

    async fn get_rule(&self, id: &str) -> Result<Option<AlertRule>>;

    /// Replaces the stored rule with `rule` (matched by `rule.id`).
    async fn update_rule(&self, rule: &AlertRule) -> Result<()>;

    /// Returns true if a rule was deleted.
    async fn delete_rule(&self, id: &str) -> Result<bool>;

    async fn list_rules(&self) -> Result<Vec<AlertRule>>;

    /// Rules considered by an evaluation pass.
    async fn list_enabled_rules(&self) -> Result<Vec<AlertRule>>;
}

/// CRUD for alert instances.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert_alert(&self, alert: &Alert) -> Result<()>;

    /// Replaces the stored alert with `alert` (matched by `alert.id`).
    async fn update_alert(&self, alert: &Alert) -> Result<()>;

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>>;

    /// The single open (triggered or acknowledged) alert for a rule/host
    /// pair, if one exists.
    async fn find_open_alert(&self, rule_id: &str, host_id: &str) -> Result<Option<Alert>>;

    async fn list_open_alerts(&self) -> Result<Vec<Alert>>;

    /// Alerts opened at or after `from`, for statistics.
    async fn list_alerts_since(&self, from: DateTime<Utc>) -> Result<Vec<Alert>>;
}

/// CRUD for notification channel specs.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn insert_channel(&self, spec: &ChannelSpec) -> Result<()>;

    async fn get_channel(&self, id: &str) -> Result<Option<ChannelSpec>>;

    /// Replaces the stored spec with `spec` (matched by `spec.id`).
    async fn update_channel(&self, spec: &ChannelSpec) -> Result<()>;

    /// Returns true if a channel was deleted.
    async fn delete_channel(&self, id: &str) -> Result<bool>;

    async fn list_channels(&self) -> Result<Vec<ChannelSpec>>;
}

/// CRUD for alert mutes.
#[async_trait]
pub trait MuteRepository: Send + Sync {
    async fn insert_mute(&self, mute: &AlertMute) -> Result<()>;

    /// Returns true if a mute was deleted.
    async fn delete_mute(&self, id: &str) -> Result<bool>;

    async fn list_mutes(&self) -> Result<Vec<AlertMute>>;

    /// Removes mutes whose `expires_at` is in the past. Returns the number
    /// removed.
    async fn delete_expired_mutes(&self, now: DateTime<Utc>) -> Result<u64>;
}
