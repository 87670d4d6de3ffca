use anyhow::Result;
use async_trait::async_trait;
use fleetmon_common::types::{HostStatus, MetricReading};

/// The metric/status data collaborator.
///
/// Pull-based: the engine polls it once per evaluation pass, caching
/// readings per (host, metric) within the pass so two rules watching the
/// same metric see the same observation.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Hosts currently known to the fleet inventory. Rules with no host
    /// scope are evaluated against each of these.
    async fn host_ids(&self) -> Result<Vec<String>>;

    /// Latest reading of `metric_name` on `host_id`, if the source has
    /// one.
    async fn latest_reading(
        &self,
        host_id: &str,
        metric_name: &str,
    ) -> Result<Option<MetricReading>>;

    /// Current reachability of `host_id`.
    async fn latest_status(&self, host_id: &str) -> Result<HostStatus>;
}
