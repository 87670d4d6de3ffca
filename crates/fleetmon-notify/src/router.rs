//! Resolves a rule's channel references into dispatchable channel specs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use fleetmon_common::types::{Alert, AlertRule, ChannelSpec};
use fleetmon_storage::ChannelRepository;

pub struct NotificationRouter {
    channels: Arc<dyn ChannelRepository>,
}

impl NotificationRouter {
    pub fn new(channels: Arc<dyn ChannelRepository>) -> Self {
        Self { channels }
    }

    /// Returns the enabled channels attached to `rule` that accept the
    /// alert's severity, deduplicated in configured order.
    ///
    /// Dangling references (a channel ID with no stored spec) are logged
    /// and skipped; routing never fails on misconfiguration.
    pub async fn route(&self, alert: &Alert, rule: &AlertRule) -> Result<Vec<ChannelSpec>> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for channel_id in &rule.channel_ids {
            if !seen.insert(channel_id.clone()) {
                continue;
            }
            let Some(spec) = self.channels.get_channel(channel_id).await? else {
                tracing::debug!(
                    rule_id = %rule.id,
                    channel_id = %channel_id,
                    "Rule references unknown channel, skipping"
                );
                continue;
            };
            if !spec.enabled {
                continue;
            }
            if alert.severity < spec.min_severity {
                tracing::debug!(
                    alert_id = %alert.id,
                    channel_id = %channel_id,
                    alert_severity = %alert.severity,
                    min_severity = %spec.min_severity,
                    "Channel filtered by severity"
                );
                continue;
            }
            resolved.push(spec);
        }

        Ok(resolved)
    }
}
