use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use super::store::OtpStore;

/// Periodically drop expired codes that nobody came back to verify.
///
/// Verification already discards expired records lazily, this only bounds
/// memory for addresses that never return.
pub fn spawn_expiry_sweeper(store: Arc<OtpStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            let purged = store.purge_expired();
            if purged > 0 {
                tracing::info!(purged, "Purged expired OTP records");
            }
        }
    })
}
