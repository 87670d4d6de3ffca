//! In-memory reference implementation of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::{AlertRepository, ChannelRepository, MuteRepository, RuleRepository};
use fleetmon_common::types::{Alert, AlertMute, AlertRule, ChannelSpec};

/// Stores every record in process memory behind `RwLock`-guarded maps.
///
/// Insertion order is not preserved; list methods sort by creation time so
/// behavior matches a `created_at`-ordered database query.
#[derive(Default)]
pub struct MemoryStore {
    rules: RwLock<HashMap<String, AlertRule>>,
    alerts: RwLock<HashMap<String, Alert>>,
    channels: RwLock<HashMap<String, ChannelSpec>>,
    mutes: RwLock<HashMap<String, AlertMute>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleRepository for MemoryStore {
    async fn insert_rule(&self, rule: &AlertRule) -> Result<()> {
        self.rules
            .write()
            .await
            .insert(rule.id.clone(), rule.clone());
        Ok(())
    }

    async fn get_rule(&self, id: &str) -> Result<Option<AlertRule>> {
        Ok(self.rules.read().await.get(id).cloned())
    }

    async fn update_rule(&self, rule: &AlertRule) -> Result<()> {
        let mut rules = self.rules.write().await;
        match rules.get_mut(&rule.id) {
            Some(existing) => {
                *existing = rule.clone();
                Ok(())
            }
            None => Err(crate::error::StorageError::NotFound {
                entity: "alert_rule",
                id: rule.id.clone(),
            }),
        }
    }

    async fn delete_rule(&self, id: &str) -> Result<bool> {
        Ok(self.rules.write().await.remove(id).is_some())
    }

    async fn list_rules(&self) -> Result<Vec<AlertRule>> {
        let mut rules: Vec<AlertRule> = self.rules.read().await.values().cloned().collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rules)
    }

    async fn list_enabled_rules(&self) -> Result<Vec<AlertRule>> {
        let mut rules: Vec<AlertRule> = self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rules)
    }
}

#[async_trait]
impl AlertRepository for MemoryStore {
    async fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.alerts
            .write()
            .await
            .insert(alert.id.clone(), alert.clone());
        Ok(())
    }

    async fn update_alert(&self, alert: &Alert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&alert.id) {
            Some(existing) => {
                *existing = alert.clone();
                Ok(())
            }
            None => Err(crate::error::StorageError::NotFound {
                entity: "alert",
                id: alert.id.clone(),
            }),
        }
    }

    async fn get_alert(&self, id: &str) -> Result<Option<Alert>> {
        Ok(self.alerts.read().await.get(id).cloned())
    }

    async fn find_open_alert(&self, rule_id: &str, host_id: &str) -> Result<Option<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .find(|a| a.status.is_open() && a.rule_id == rule_id && a.host_id == host_id)
            .cloned())
    }

    async fn list_open_alerts(&self) -> Result<Vec<Alert>> {
        let mut open: Vec<Alert> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.status.is_open())
            .cloned()
            .collect();
        open.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        Ok(open)
    }

    async fn list_alerts_since(&self, from: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.opened_at >= from)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        Ok(alerts)
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn insert_channel(&self, spec: &ChannelSpec) -> Result<()> {
        self.channels
            .write()
            .await
            .insert(spec.id.clone(), spec.clone());
        Ok(())
    }

    async fn get_channel(&self, id: &str) -> Result<Option<ChannelSpec>> {
        Ok(self.channels.read().await.get(id).cloned())
    }

    async fn update_channel(&self, spec: &ChannelSpec) -> Result<()> {
        let mut channels = self.channels.write().await;
        match channels.get_mut(&spec.id) {
            Some(existing) => {
                *existing = spec.clone();
                Ok(())
            }
            None => Err(crate::error::StorageError::NotFound {
                entity: "notification_channel",
                id: spec.id.clone(),
            }),
        }
    }

    async fn delete_channel(&self, id: &str) -> Result<bool> {
        Ok(self.channels.write().await.remove(id).is_some())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSpec>> {
        let mut channels: Vec<ChannelSpec> =
            self.channels.read().await.values().cloned().collect();
        channels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(channels)
    }
}

#[async_trait]
impl MuteRepository for MemoryStore {
    async fn insert_mute(&self, mute: &AlertMute) -> Result<()> {
        self.mutes
            .write()
            .await
            .insert(mute.id.clone(), mute.clone());
        Ok(())
    }

    async fn delete_mute(&self, id: &str) -> Result<bool> {
        Ok(self.mutes.write().await.remove(id).is_some())
    }

    async fn list_mutes(&self) -> Result<Vec<AlertMute>> {
        let mut mutes: Vec<AlertMute> = self.mutes.read().await.values().cloned().collect();
        mutes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(mutes)
    }

    async fn delete_expired_mutes(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut mutes = self.mutes.write().await;
        let before = mutes.len();
        mutes.retain(|_, m| m.is_active(now));
        Ok((before - mutes.len()) as u64)
    }
}
