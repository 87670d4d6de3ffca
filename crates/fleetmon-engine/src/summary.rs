use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use fleetmon_common::types::{Alert, AlertStatus};

/// Aggregate alert statistics over a reporting window.
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total: u64,
    pub triggered: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub by_severity: HashMap<String, u64>,
    pub by_rule: HashMap<String, u64>,
    pub by_host: HashMap<String, u64>,
}

/// Counts `alerts` by status, severity, rule, and host.
pub fn summarize(alerts: &[Alert], from: DateTime<Utc>, to: DateTime<Utc>) -> AlertSummary {
    let mut summary = AlertSummary {
        from,
        to,
        total: alerts.len() as u64,
        triggered: 0,
        acknowledged: 0,
        resolved: 0,
        by_severity: HashMap::new(),
        by_rule: HashMap::new(),
        by_host: HashMap::new(),
    };

    for alert in alerts {
        match alert.status {
            AlertStatus::Triggered => summary.triggered += 1,
            AlertStatus::Acknowledged => summary.acknowledged += 1,
            AlertStatus::Resolved => summary.resolved += 1,
        }
        *summary
            .by_severity
            .entry(alert.severity.to_string())
            .or_insert(0) += 1;
        *summary.by_rule.entry(alert.rule_id.clone()).or_insert(0) += 1;
        *summary.by_host.entry(alert.host_id.clone()).or_insert(0) += 1;
    }

    summary
}
