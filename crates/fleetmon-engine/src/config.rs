use serde::{Deserialize, Serialize};

/// Tunables for the evaluation loop and dispatch fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scheduled evaluation passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on one evaluation pass; a pass still running after this
    /// is abandoned so it cannot delay the next tick indefinitely.
    #[serde(default = "default_pass_timeout_secs")]
    pub pass_timeout_secs: u64,

    /// Open alerts with no qualifying observation for this long are
    /// auto-resolved.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Maximum concurrent channel sends across the whole engine.
    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,

    /// Per-channel send timeout in seconds.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            pass_timeout_secs: default_pass_timeout_secs(),
            stale_after_secs: default_stale_after_secs(),
            dispatch_concurrency: default_dispatch_concurrency(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_pass_timeout_secs() -> u64 {
    300
}

fn default_stale_after_secs() -> u64 {
    900
}

fn default_dispatch_concurrency() -> usize {
    5
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

impl EngineConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
