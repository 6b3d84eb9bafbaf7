//! Periodic removal of leg records whose completion never arrived

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use confstream_leg_core::CallFlowController;

/// Every `interval`, drop records idle for `max_age` and hang up their streaming legs
pub fn spawn_stale_sweeper(
    controller: Arc<CallFlowController>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = controller.sweep_stale(max_age).await;
            if swept > 0 {
                info!("Swept {} stale leg records, {} remain", swept, controller.registry().len());
            }
        }
    })
}
