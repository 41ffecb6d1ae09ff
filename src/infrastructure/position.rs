//! Latest-position feed. Readers never wait for a fresher fix.

use crate::domain::models::GeoPoint;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PositionFeed {
    tx: watch::Sender<Option<GeoPoint>>,
}

impl PositionFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Record a new fix. Non-finite fixes are ignored and the previous one kept.
    pub fn publish(&self, point: GeoPoint) {
        if !point.is_finite() {
            warn!("Ignoring non-finite position fix {:?}", point);
            return;
        }
        debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            "Position updated"
        );
        self.tx.send_replace(Some(point));
    }

    pub fn latest(&self) -> Option<GeoPoint> {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<GeoPoint>> {
        self.tx.subscribe()
    }
}

impl Default for PositionFeed {
    fn default() -> Self {
        Self::new()
    }
}
