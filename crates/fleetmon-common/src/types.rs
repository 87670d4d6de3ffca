use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use fleetmon_common::types::Severity;
///
/// let sev: Severity = "warning".parse().unwrap();
/// assert_eq!(sev, Severity::Warning);
/// assert_eq!(sev.to_string(), "warning");
/// assert!(Severity::Critical > Severity::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Reported reachability state of a monitored device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Online,
    Offline,
    Unknown,
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostStatus::Online => write!(f, "online"),
            HostStatus::Offline => write!(f, "offline"),
            HostStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for HostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(HostStatus::Online),
            "offline" => Ok(HostStatus::Offline),
            "unknown" => Ok(HostStatus::Unknown),
            _ => Err(format!("unknown host status: {s}")),
        }
    }
}

/// A single metric observation pulled from the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReading {
    pub host_id: String,
    pub metric_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Comparison operator used by threshold rules.
///
/// `Eq`/`Ne` compare f64 values exactly (IEEE-754 bitwise-equal semantics
/// for normal values); callers that need tolerance should express the rule
/// as a pair of `Gt`/`Lt` bounds instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Gte => value >= threshold,
            Self::Lt => value < threshold,
            Self::Lte => value <= threshold,
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
        }
    }

    /// Human-readable phrase for alert messages (e.g. "above").
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Gt => "above",
            Self::Gte => "at or above",
            Self::Lt => "below",
            Self::Lte => "at or below",
            Self::Eq => "equal to",
            Self::Ne => "different from",
        }
    }
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" | "gt" => Ok(Self::Gt),
            "greater_equal" | "gte" => Ok(Self::Gte),
            "less_than" | "lt" => Ok(Self::Lt),
            "less_equal" | "lte" => Ok(Self::Lte),
            "equal" | "eq" => Ok(Self::Eq),
            "not_equal" | "ne" => Ok(Self::Ne),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Ne => "ne",
        };
        write!(f, "{s}")
    }
}

/// The two supported rule families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Compare the latest reading of a metric against a fixed threshold.
    Threshold,
    /// Fire when a host's reachability state changes between passes.
    StatusChange,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Threshold => write!(f, "threshold"),
            RuleKind::StatusChange => write!(f, "status_change"),
        }
    }
}

impl std::str::FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threshold" => Ok(RuleKind::Threshold),
            "status_change" => Ok(RuleKind::StatusChange),
            _ => Err(format!("unknown rule kind: {s}")),
        }
    }
}

/// A persisted alert rule definition.
///
/// Threshold rules require `metric_name`, `condition`, and `threshold`;
/// status-change rules need none of them. `host_id = None` scopes the rule
/// to every known host. Shape constraints are enforced by
/// `fleetmon_alert::rule::validate` at creation time, not at evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: RuleKind,
    pub metric_name: Option<String>,
    pub host_id: Option<String>,
    pub condition: Option<CompareOp>,
    pub threshold: Option<f64>,
    pub severity: Severity,
    pub enabled: bool,
    /// Channels to notify, in configured order. Duplicates are tolerated
    /// here and deduplicated at routing time.
    pub channel_ids: Vec<String>,
    pub cooldown_minutes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of an alert instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    /// Open alerts participate in deduplication; resolved ones do not.
    pub fn is_open(&self) -> bool {
        matches!(self, AlertStatus::Triggered | AlertStatus::Acknowledged)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Triggered => write!(f, "triggered"),
            AlertStatus::Acknowledged => write!(f, "acknowledged"),
            AlertStatus::Resolved => write!(f, "resolved"),
        }
    }
}

/// A tracked occurrence of a rule's condition on a specific host.
///
/// At most one open alert exists per `(rule_id, host_id)` pair; repeated
/// qualifying observations refresh `last_seen_at` and `value_observed`
/// instead of creating new rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub host_id: String,
    /// Copied from the rule when the alert opened; later rule edits do not
    /// retroactively change open alerts.
    pub severity: Severity,
    pub status: AlertStatus,
    pub value_observed: f64,
    pub message: String,
    pub opened_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Supported notification channel families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Slack,
    Discord,
    Webhook,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Slack => write!(f, "slack"),
            ChannelKind::Discord => write!(f, "discord"),
            ChannelKind::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(ChannelKind::Email),
            "slack" => Ok(ChannelKind::Slack),
            "discord" => Ok(ChannelKind::Discord),
            "webhook" => Ok(ChannelKind::Webhook),
            _ => Err(format!("unknown channel kind: {s}")),
        }
    }
}

/// A configured notification destination.
///
/// `config` is a kind-specific JSON blob validated when the concrete
/// channel is constructed (see `fleetmon_notify::channels::build`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    pub config: serde_json::Value,
    pub enabled: bool,
    /// Alerts below this severity are never routed to the channel.
    pub min_severity: Severity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelSpec {
    /// Copy of `config` with secrets replaced by `"***"`, for display
    /// surfaces and logs.
    pub fn redacted_config(&self) -> serde_json::Value {
        let mut redacted = self.config.clone();
        if let Some(obj) = redacted.as_object_mut() {
            for key in ["smtp_password", "password", "secret"] {
                if obj.contains_key(key) {
                    obj.insert(key.to_string(), serde_json::Value::String("***".into()));
                }
            }
        }
        redacted
    }
}

/// An operator-declared suppression of notifications.
///
/// Scope: both `rule_id` and `host_id` set mutes that exact pair; only
/// `rule_id` mutes the rule on every host; only `host_id` mutes every rule
/// on that host. At least one must be set. `expires_at = None` is a
/// permanent mute.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use fleetmon_common::types::AlertMute;
///
/// let now = Utc::now();
/// let mute = AlertMute {
///     id: "m-1".into(),
///     rule_id: Some("rule-1".into()),
///     host_id: None,
///     reason: Some("planned maintenance".into()),
///     muted_by: "ops".into(),
///     created_at: now,
///     expires_at: Some(now + Duration::hours(2)),
/// };
/// assert!(mute.is_active(now));
/// assert!(mute.matches("rule-1", "any-host"));
/// assert!(!mute.matches("rule-2", "any-host"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMute {
    pub id: String,
    pub rule_id: Option<String>,
    pub host_id: Option<String>,
    pub reason: Option<String>,
    pub muted_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AlertMute {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires) => expires > now,
        }
    }

    /// Whether this mute's scope covers the given rule/host pair.
    /// An unset scope field matches everything on that axis.
    pub fn matches(&self, rule_id: &str, host_id: &str) -> bool {
        let rule_ok = self.rule_id.as_deref().map_or(true, |r| r == rule_id);
        let host_ok = self.host_id.as_deref().map_or(true, |h| h == host_id);
        rule_ok && host_ok
    }
}
