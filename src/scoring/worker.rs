use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::profile::IpProfile;

use super::aggregator::RiskAggregator;
use super::prefix::PrefixCounter;

/// Score profiles across `workers` blocking tasks and rank the result.
///
/// Each worker owns its chunk of profiles; the aggregator and the prefix
/// counter are shared read-only.
pub async fn score_profiles(
    profiles: Vec<IpProfile>,
    aggregator: Arc<RiskAggregator>,
    prefix_counter: Arc<PrefixCounter>,
    workers: usize,
) -> Result<Vec<IpProfile>> {
    let total = profiles.len();
    if total == 0 {
        return Ok(profiles);
    }

    let workers = workers.clamp(1, total);
    let chunk_size = total.div_ceil(workers);

    let mut remaining = profiles;
    let mut handles = Vec::with_capacity(workers);
    while !remaining.is_empty() {
        let tail = remaining.split_off(chunk_size.min(remaining.len()));
        let mut chunk = std::mem::replace(&mut remaining, tail);
        let aggregator = Arc::clone(&aggregator);
        let prefix_counter = Arc::clone(&prefix_counter);

        handles.push(tokio::task::spawn_blocking(move || {
            for profile in chunk.iter_mut() {
                aggregator.aggregate(profile, Some(&*prefix_counter));
            }
            chunk
        }));
    }

    debug!(workers = handles.len(), chunk_size, "Scoring workers spawned");

    let mut scored = Vec::with_capacity(total);
    for handle in handles {
        let chunk = handle.await.context("Scoring worker panicked")?;
        scored.extend(chunk);
    }

    rank(&mut scored);
    info!(profiles = scored.len(), "Scoring complete");
    Ok(scored)
}

/// Highest score first, then busiest, then address for a stable order.
pub fn rank(profiles: &mut [IpProfile]) {
    profiles.sort_by(|a, b| {
        b.risk_score()
            .cmp(&a.risk_score())
            .then_with(|| b.request_count.cmp(&a.request_count))
            .then_with(|| a.address.cmp(&b.address))
    });
}
