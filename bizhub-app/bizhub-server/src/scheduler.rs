//! Periodic expiry sweep

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use bizhub_core::services::ContractService;
use bizhub_security::LoginRateLimiter;

/// Spawns the sweeper. Returns `None` when `interval_seconds` is 0.
pub fn spawn_expiry_sweeper(
    contracts: Arc<ContractService>,
    limiter: Arc<LoginRateLimiter>,
    interval_seconds: u64,
) -> Option<JoinHandle<()>> {
    if interval_seconds == 0 {
        info!("Expiry sweeper disabled");
        return None;
    }

    info!("Expiry sweeper running every {}s", interval_seconds);
    Some(tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(&contracts, &limiter).await;
        }
    }))
}

/// One pass: expire overdue contracts and drop idle rate-limiter keys.
pub async fn sweep_once(contracts: &ContractService, limiter: &LoginRateLimiter) -> usize {
    let now = Utc::now();
    let expired = match contracts.expire_overdue(now.date_naive(), now).await {
        Ok(count) => count,
        Err(e) => {
            error!("Expiry sweep failed: {}", e);
            0
        }
    };
    limiter.prune();
    expired
}
