use fleetmon_common::types::AlertStatus;

/// Errors that can occur while validating rules or driving the alert
/// lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The rule definition is missing a field required by its kind, or a
    /// field value is out of range.
    #[error("Alert: invalid rule: {0}")]
    InvalidRule(String),

    /// The mute request has no scope (neither rule nor host).
    #[error("Alert: invalid mute: {0}")]
    InvalidMute(String),

    /// The requested lifecycle transition is not legal from the alert's
    /// current status.
    #[error("Alert: cannot {action} alert {alert_id} in status '{from}'")]
    InvalidTransition {
        alert_id: String,
        from: AlertStatus,
        action: &'static str,
    },

    /// The referenced record does not exist.
    #[error("Alert: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// An underlying repository error.
    #[error(transparent)]
    Storage(#[from] fleetmon_storage::error::StorageError),
}

/// Convenience `Result` alias for alert operations.
pub type Result<T> = std::result::Result<T, AlertError>;
