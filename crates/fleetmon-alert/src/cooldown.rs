use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use fleetmon_common::types::AlertRule;

/// Per-(rule, host) notification rate limiter.
///
/// Deduplication in the alert store prevents duplicate alert *rows*; this
/// tracker prevents duplicate *notifications* when a pair legitimately
/// re-opens after resolution (flapping conditions). State is in-memory
/// only: after a restart the first alert per pair notifies again, which is
/// the safe direction to fail in.
#[derive(Default)]
pub struct CooldownTracker {
    last_notified: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no notification for `(rule, host_id)` happened within the
    /// rule's cooldown window. A pair that has never notified always
    /// passes.
    pub fn should_notify(&self, rule: &AlertRule, host_id: &str, now: DateTime<Utc>) -> bool {
        let map = self.last_notified.lock().unwrap();
        match map.get(&(rule.id.clone(), host_id.to_string())) {
            None => true,
            Some(last) => now - *last >= Duration::minutes(rule.cooldown_minutes as i64),
        }
    }

    pub fn record_notified(&self, rule_id: &str, host_id: &str, now: DateTime<Utc>) {
        self.last_notified
            .lock()
            .unwrap()
            .insert((rule_id.to_string(), host_id.to_string()), now);
    }

    /// Drops all state for a rule, e.g. after the rule is deleted.
    pub fn clear_rule(&self, rule_id: &str) {
        self.last_notified
            .lock()
            .unwrap()
            .retain(|(r, _), _| r != rule_id);
    }
}
