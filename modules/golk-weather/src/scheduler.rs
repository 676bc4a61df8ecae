use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::updater::{BatchOutcome, WeatherUpdater};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub alive: bool,
    pub batch_size: usize,
    pub update_interval_hours: f64,
    pub scheduler_interval_minutes: u64,
}

/// Fixed-interval loop around [`WeatherUpdater::update_batch`].
pub struct WeatherScheduler {
    updater: Arc<WeatherUpdater>,
    interval_minutes: u64,
    running: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WeatherScheduler {
    pub fn new(updater: Arc<WeatherUpdater>, interval_minutes: u64) -> Self {
        Self {
            updater,
            interval_minutes: interval_minutes.max(1),
            running: AtomicBool::new(false),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the loop: reset stamps, run a batch immediately, then every interval.
    /// Returns false if already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Weather scheduler is already running");
            return false;
        }

        let updater = self.updater.clone();
        let period = Duration::from_secs(self.interval_minutes * 60);
        info!(interval_minutes = self.interval_minutes, "Starting weather scheduler");

        let handle = tokio::spawn(async move {
            if let Err(e) = updater.store().reset_update_timestamps().await {
                error!(error = %e, "Failed to reset timestamps on start");
            }

            let mut ticker = tokio::time::interval(period);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                if let Err(e) = updater.update_batch(Utc::now()).await {
                    error!(error = %e, "Weather batch update failed");
                }
            }
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
        true
    }

    /// Reset every stamp and run one batch now, outside the loop.
    pub async fn force_refresh(&self) -> Result<BatchOutcome> {
        info!("Forcing a complete weather data refresh");
        self.updater.store().reset_update_timestamps().await?;
        self.updater.update_batch(Utc::now()).await
    }

    pub fn is_alive(&self) -> bool {
        self.handle
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.running.load(Ordering::SeqCst),
            alive: self.is_alive(),
            batch_size: self.updater.batch_size(),
            update_interval_hours: self.updater.update_interval_hours(),
            scheduler_interval_minutes: self.interval_minutes,
        }
    }

    pub fn stop(&self) {
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
                info!("Weather scheduler stopped");
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for WeatherScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::tests::{coordinates_file, FakeSource, MemoryStore};

    fn scheduler(store: Arc<MemoryStore>, coords: &tempfile::NamedTempFile) -> WeatherScheduler {
        let updater = WeatherUpdater::new(
            Arc::new(FakeSource {
                current: true,
                climate: true,
            }),
            store,
            coords.path(),
            58,
            2.0,
        );
        WeatherScheduler::new(Arc::new(updater), 2)
    }

    #[tokio::test]
    async fn status_before_start() {
        let coords = coordinates_file(&[]);
        let s = scheduler(Arc::new(MemoryStore::default()), &coords);
        assert_eq!(
            s.status(),
            SchedulerStatus {
                running: false,
                alive: false,
                batch_size: 58,
                update_interval_hours: 2.0,
                scheduler_interval_minutes: 2,
            }
        );
    }

    #[tokio::test]
    async fn start_twice_is_rejected_and_stop_ends_the_loop() {
        let coords = coordinates_file(&["Kandy"]);
        let store = Arc::new(MemoryStore::with_areas(&[("Kandy", None)]));
        let s = scheduler(store.clone(), &coords);

        assert!(s.start());
        assert!(!s.start());
        assert!(s.is_alive());

        // Let the immediate batch run.
        for _ in 0..50 {
            if store.writes.lock().unwrap().len() >= 12 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.writes.lock().unwrap().len(), 12);
        assert!(*store.resets.lock().unwrap() >= 1);

        s.stop();
        assert!(!s.status().running);
        assert!(!s.is_alive());
        assert!(s.start());
        s.stop();
    }

    #[tokio::test]
    async fn force_refresh_resets_then_updates() {
        let coords = coordinates_file(&["Kandy", "Galle"]);
        let store = Arc::new(MemoryStore::with_areas(&[
            ("Kandy", Some(Utc::now())),
            ("Galle", Some(Utc::now())),
        ]));
        let s = scheduler(store.clone(), &coords);

        let outcome = s.force_refresh().await.unwrap();
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(*store.resets.lock().unwrap(), 1);
    }
}
