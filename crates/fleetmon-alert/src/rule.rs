//! Rule-shape validation, applied at creation and update time.
//!
//! Evaluation assumes rules that passed this check, so malformed
//! definitions are rejected before they are ever persisted.

use crate::error::{AlertError, Result};
use fleetmon_common::types::{AlertRule, RuleKind};

/// Checks that `rule` carries every field its kind requires.
pub fn validate(rule: &AlertRule) -> Result<()> {
    if rule.name.trim().is_empty() {
        return Err(AlertError::InvalidRule("name must not be empty".into()));
    }

    match rule.kind {
        RuleKind::Threshold => {
            if rule
                .metric_name
                .as_deref()
                .map_or(true, |m| m.trim().is_empty())
            {
                return Err(AlertError::InvalidRule(
                    "threshold rules require metric_name".into(),
                ));
            }
            if rule.condition.is_none() {
                return Err(AlertError::InvalidRule(
                    "threshold rules require a condition".into(),
                ));
            }
            match rule.threshold {
                None => {
                    return Err(AlertError::InvalidRule(
                        "threshold rules require a threshold value".into(),
                    ));
                }
                Some(t) if !t.is_finite() => {
                    return Err(AlertError::InvalidRule(
                        "threshold must be a finite number".into(),
                    ));
                }
                Some(_) => {}
            }
        }
        // Status-change rules key off the host's reachability transitions;
        // metric fields are simply ignored if present.
        RuleKind::StatusChange => {}
    }

    Ok(())
}
