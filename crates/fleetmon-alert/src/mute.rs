//! Operator-declared notification suppression.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::error::{AlertError, Result};
use fleetmon_common::types::AlertMute;
use fleetmon_storage::MuteRepository;

/// Tracks active, possibly time-bounded suppressions keyed by rule and/or
/// host.
///
/// A mute silences notification dispatch only — alerts are still created
/// and their lifecycle tracked, so the historical record survives planned
/// maintenance windows.
pub struct MuteRegistry {
    repo: Arc<dyn MuteRepository>,
}

impl MuteRegistry {
    pub fn new(repo: Arc<dyn MuteRepository>) -> Self {
        Self { repo }
    }

    /// Creates a mute. At least one of `rule_id`/`host_id` must be set;
    /// `duration = None` mutes permanently (until unmuted).
    pub async fn mute(
        &self,
        rule_id: Option<String>,
        host_id: Option<String>,
        reason: Option<String>,
        muted_by: &str,
        duration: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<AlertMute> {
        if rule_id.is_none() && host_id.is_none() {
            return Err(AlertError::InvalidMute(
                "at least one of rule_id or host_id must be set".into(),
            ));
        }

        let mute = AlertMute {
            id: fleetmon_common::id::next_id(),
            rule_id,
            host_id,
            reason,
            muted_by: muted_by.to_string(),
            created_at: now,
            expires_at: duration.map(|d| now + d),
        };
        self.repo.insert_mute(&mute).await?;
        tracing::info!(
            mute_id = %mute.id,
            rule_id = ?mute.rule_id,
            host_id = ?mute.host_id,
            expires_at = ?mute.expires_at,
            "Mute created"
        );
        Ok(mute)
    }

    pub async fn unmute(&self, mute_id: &str) -> Result<()> {
        if !self.repo.delete_mute(mute_id).await? {
            return Err(AlertError::NotFound {
                entity: "alert_mute",
                id: mute_id.to_string(),
            });
        }
        tracing::info!(mute_id = %mute_id, "Mute removed");
        Ok(())
    }

    /// True if any active mute covers the pair. Expired mutes are ignored
    /// without requiring deletion.
    pub async fn is_muted(
        &self,
        rule_id: &str,
        host_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mutes = self.repo.list_mutes().await?;
        Ok(mutes
            .iter()
            .any(|m| m.is_active(now) && m.matches(rule_id, host_id)))
    }

    pub async fn list(&self) -> Result<Vec<AlertMute>> {
        Ok(self.repo.list_mutes().await?)
    }

    /// Removes expired rows to bound registry growth; run once per
    /// evaluation pass.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = self.repo.delete_expired_mutes(now).await?;
        if removed > 0 {
            tracing::debug!(removed, "Pruned expired mutes");
        }
        Ok(removed)
    }
}
