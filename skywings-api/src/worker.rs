use std::sync::Arc;

use chrono::Utc;
use skywings_order::BookingManager;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Periodically cancel blocked bookings whose balance was not paid in time.
pub async fn start_expiry_worker(manager: Arc<BookingManager>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Expiry worker started, sweeping every {:?}", every);

    loop {
        ticker.tick().await;
        match manager.expire_overdue(Utc::now()).await {
            Ok(0) => {}
            Ok(n) => info!("Expired {} unpaid blocked bookings", n),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
