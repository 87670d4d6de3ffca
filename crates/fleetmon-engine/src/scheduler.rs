use std::sync::Arc;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};

use crate::config::EngineConfig;
use crate::engine::MonitorEngine;

/// Drives periodic evaluation passes.
///
/// Each pass is bounded by `pass_timeout_secs`; a pass that overruns is
/// abandoned and logged so a stuck channel or source cannot delay the
/// next scheduled pass indefinitely. On-demand passes are still available
/// by calling [`MonitorEngine::evaluate_all`] directly.
pub struct Scheduler {
    engine: Arc<MonitorEngine>,
    interval_secs: u64,
    pass_timeout_secs: u64,
}

impl Scheduler {
    pub fn new(engine: Arc<MonitorEngine>, config: &EngineConfig) -> Self {
        Self {
            engine,
            interval_secs: config.interval_secs,
            pass_timeout_secs: config.pass_timeout_secs,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.interval_secs,
            pass_timeout_secs = self.pass_timeout_secs,
            "Evaluation scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_secs.max(1)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let pass = self.engine.evaluate_all();
            match timeout(Duration::from_secs(self.pass_timeout_secs), pass).await {
                Ok(Ok(report)) => {
                    tracing::info!(
                        fired = report.fired.len(),
                        refreshed = report.refreshed,
                        auto_resolved = report.auto_resolved.len(),
                        muted = report.suppressed_muted,
                        cooldown = report.suppressed_cooldown,
                        rule_errors = report.rule_errors,
                        dispatches = report.dispatches.len(),
                        "Evaluation pass complete"
                    );
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Evaluation pass failed");
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = self.pass_timeout_secs,
                        "Evaluation pass timed out"
                    );
                }
            }
        }
    }
}
