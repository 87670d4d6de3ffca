//! Concurrent fan-out of one notification to many channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

use crate::channels;
use crate::{DispatchResult, NotificationChannel, NotificationMessage};
use fleetmon_common::types::ChannelSpec;

/// Fans a payload out to every resolved channel, isolating failures.
///
/// Sends run on separate tasks gated by a semaphore, so a large channel
/// fan-out cannot spawn unbounded work and a slow channel cannot starve
/// its siblings. Each send is bounded by `send_timeout`; a timeout, a
/// transport error, or a panicking channel all become a `success = false`
/// result for that channel only. There are no internal retries —
/// redelivery, if wanted, is driven by a collaborator reading the
/// returned [`DispatchResult`]s.
pub struct ChannelDispatcher {
    built: Mutex<HashMap<String, Arc<dyn NotificationChannel>>>,
    semaphore: Arc<Semaphore>,
    send_timeout: Duration,
}

impl ChannelDispatcher {
    pub fn new(max_concurrency: usize, send_timeout: Duration) -> Self {
        Self {
            built: Mutex::new(HashMap::new()),
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            send_timeout,
        }
    }

    /// Drops the cached channel instance for `channel_id`, forcing a
    /// rebuild from its spec on the next dispatch. Call after a channel
    /// config update or deletion.
    pub async fn invalidate(&self, channel_id: &str) {
        self.built.lock().await.remove(channel_id);
    }

    /// Sends `message` to every channel in `specs` concurrently and
    /// returns one result per spec, in input order. Never fails as a
    /// whole: per-channel problems are recorded in the results.
    pub async fn dispatch(
        &self,
        message: &NotificationMessage,
        specs: &[ChannelSpec],
    ) -> Vec<DispatchResult> {
        enum Pending {
            Failed(DispatchResult),
            Sending {
                channel_id: String,
                channel_type: String,
                handle: tokio::task::JoinHandle<DispatchResult>,
            },
        }

        let mut pending = Vec::with_capacity(specs.len());

        for spec in specs {
            let channel = match self.channel_for(spec).await {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::error!(
                        channel_id = %spec.id,
                        error = %e,
                        "Failed to build notification channel"
                    );
                    pending.push(Pending::Failed(DispatchResult {
                        channel_id: spec.id.clone(),
                        channel_type: spec.kind.to_string(),
                        success: false,
                        error: Some(e.to_string()),
                        duration: Duration::ZERO,
                    }));
                    continue;
                }
            };

            let semaphore = self.semaphore.clone();
            let message = message.clone();
            let send_timeout = self.send_timeout;
            let channel_id = spec.id.clone();
            let channel_type = spec.kind.to_string();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let start = Instant::now();
                let outcome = tokio::time::timeout(send_timeout, channel.deliver(&message)).await;
                let duration = start.elapsed();

                let error = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(_) => Some(format!(
                        "delivery timed out after {}s",
                        send_timeout.as_secs()
                    )),
                };
                DispatchResult {
                    channel_id,
                    channel_type,
                    success: error.is_none(),
                    error,
                    duration,
                }
            });
            pending.push(Pending::Sending {
                channel_id: spec.id.clone(),
                channel_type: spec.kind.to_string(),
                handle,
            });
        }

        let mut results = Vec::with_capacity(pending.len());
        for entry in pending {
            let result = match entry {
                Pending::Failed(result) => result,
                Pending::Sending {
                    channel_id,
                    channel_type,
                    handle,
                } => match handle.await {
                    Ok(result) => result,
                    Err(e) => DispatchResult {
                        channel_id,
                        channel_type,
                        success: false,
                        error: Some(format!("delivery task failed: {e}")),
                        duration: Duration::ZERO,
                    },
                },
            };

            match &result.error {
                Some(error) => tracing::error!(
                    channel_id = %result.channel_id,
                    channel_type = %result.channel_type,
                    error = %error,
                    "Notification delivery failed"
                ),
                None => tracing::info!(
                    channel_id = %result.channel_id,
                    channel_type = %result.channel_type,
                    elapsed_ms = result.duration.as_millis() as u64,
                    "Notification delivered"
                ),
            }
            results.push(result);
        }

        results
    }

    async fn channel_for(&self, spec: &ChannelSpec) -> crate::error::Result<Arc<dyn NotificationChannel>> {
        let mut built = self.built.lock().await;
        if let Some(channel) = built.get(&spec.id) {
            return Ok(channel.clone());
        }
        let channel: Arc<dyn NotificationChannel> = Arc::from(channels::build(spec)?);
        built.insert(spec.id.clone(), channel.clone());
        Ok(channel)
    }
}
