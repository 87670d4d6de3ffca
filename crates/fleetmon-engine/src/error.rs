/// Errors surfaced by engine operations.
///
/// Per-rule evaluation failures inside a pass are caught and counted in
/// the pass report; this type covers operations that fail as a whole
/// (listing the rule catalog, lifecycle transitions requested by an
/// operator, management calls).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Alert(#[from] fleetmon_alert::error::AlertError),

    #[error(transparent)]
    Notify(#[from] fleetmon_notify::error::NotifyError),

    #[error(transparent)]
    Storage(#[from] fleetmon_storage::error::StorageError),

    /// The metric/status source collaborator failed.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
