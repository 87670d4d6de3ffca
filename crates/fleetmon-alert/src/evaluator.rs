//! Stateless fire/no-fire decision for a single rule and observation.
//!
//! All deduplication and continuation state lives in
//! [`crate::store::AlertStore`]; this module only answers "does this
//! observation satisfy this rule right now", so calls are safe to run in
//! parallel across rules.

use crate::error::{AlertError, Result};
use fleetmon_common::types::{AlertRule, HostStatus, MetricReading, RuleKind};

/// The observation a rule is evaluated against.
#[derive(Debug, Clone)]
pub enum RuleInput {
    /// Latest reading for the rule's metric on one host.
    Reading(MetricReading),
    /// Host reachability seen this pass and the last pass.
    Status {
        host_id: String,
        previous: Option<HostStatus>,
        current: HostStatus,
    },
}

/// Result of evaluating one rule against one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    NoMatch,
    Fires { value: f64, message: String },
}

/// Evaluates `rule` against `input`.
///
/// A mis-shaped rule (e.g. a threshold rule with no threshold) is an
/// [`AlertError::InvalidRule`]; such rules are rejected at creation time,
/// so hitting this at evaluation time means the catalog was bypassed.
pub fn evaluate(rule: &AlertRule, input: &RuleInput) -> Result<EvaluationOutcome> {
    match (rule.kind, input) {
        (RuleKind::Threshold, RuleInput::Reading(reading)) => {
            evaluate_threshold(rule, reading)
        }
        (
            RuleKind::StatusChange,
            RuleInput::Status {
                host_id,
                previous,
                current,
            },
        ) => Ok(evaluate_status_change(host_id, *previous, *current)),
        _ => Ok(EvaluationOutcome::NoMatch),
    }
}

fn evaluate_threshold(rule: &AlertRule, reading: &MetricReading) -> Result<EvaluationOutcome> {
    let metric = rule
        .metric_name
        .as_deref()
        .ok_or_else(|| AlertError::InvalidRule("threshold rule without metric_name".into()))?;
    let condition = rule
        .condition
        .ok_or_else(|| AlertError::InvalidRule("threshold rule without condition".into()))?;
    let threshold = rule
        .threshold
        .ok_or_else(|| AlertError::InvalidRule("threshold rule without threshold".into()))?;

    if reading.metric_name != metric {
        return Ok(EvaluationOutcome::NoMatch);
    }

    if !condition.check(reading.value, threshold) {
        return Ok(EvaluationOutcome::NoMatch);
    }

    let message = format!(
        "{} is {} {:.1} on {} (observed {:.2})",
        metric,
        condition.describe(),
        threshold,
        reading.host_id,
        reading.value,
    );
    Ok(EvaluationOutcome::Fires {
        value: reading.value,
        message,
    })
}

fn evaluate_status_change(
    host_id: &str,
    previous: Option<HostStatus>,
    current: HostStatus,
) -> EvaluationOutcome {
    // First observation for a host, or a host we lost track of: nothing to
    // compare against yet.
    let previous = match previous {
        None | Some(HostStatus::Unknown) => return EvaluationOutcome::NoMatch,
        Some(p) => p,
    };

    if previous == current {
        return EvaluationOutcome::NoMatch;
    }

    EvaluationOutcome::Fires {
        value: if current == HostStatus::Online { 1.0 } else { 0.0 },
        message: format!("{host_id} changed status: {previous} -> {current}"),
    }
}
