//! Background housekeeping for the admission table and the response cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::admission::AdmissionController;
use crate::cache::ResponseCache;

pub struct Sweeper {
    admission: Arc<AdmissionController>,
    cache: Arc<ResponseCache>,
    admission_every: Duration,
    cache_every: Duration,
}

impl Sweeper {
    pub fn new(
        admission: Arc<AdmissionController>,
        cache: Arc<ResponseCache>,
        admission_every: Duration,
        cache_every: Duration,
    ) -> Self {
        Self {
            admission,
            cache,
            admission_every: admission_every.max(Duration::from_millis(1)),
            cache_every: cache_every.max(Duration::from_millis(1)),
        }
    }

    /// Tick both sweeps on their own intervals until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("sweeper started");

        let mut admission_tick = tokio::time::interval(self.admission_every);
        let mut cache_tick = tokio::time::interval(self.cache_every);
        // The first tick of an interval fires immediately; skip it.
        admission_tick.tick().await;
        cache_tick.tick().await;

        loop {
            tokio::select! {
                _ = admission_tick.tick() => {
                    let tracked = self.admission.sweep();
                    debug!(tracked, "admission sweep");
                }
                _ = cache_tick.tick() => {
                    let purged = self.cache.purge_expired();
                    if purged > 0 {
                        debug!(purged, "expired cache entries purged");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }
}
