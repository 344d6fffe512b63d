//! Per-appliance polling coordinator.
//!
//! A coordinator owns one appliance, refreshes it on a fixed interval and
//! publishes the last successful snapshot to every entity of that appliance.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;
use tokio::task::JoinHandle;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::appliance::Appliance;
use crate::appliance::ApplianceError;
use crate::appliance::ApplianceInfo;
use crate::appliance::ApplianceSnapshot;

/// Default refresh interval for appliances.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(10);

const MANIFEST: &str = include_str!("manifest.json");

#[derive(Debug, Deserialize)]
struct Manifest {
    version: String,
}

static HON_VERSION: Lazy<String> = Lazy::new(|| {
    match serde_json::from_str::<Manifest>(MANIFEST) {
        Ok(manifest) => manifest.version,
        Err(e) => {
            warn!("Failed to parse hon manifest: {}", e);
            String::new()
        }
    }
});

/// Integration and library versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HonInfo {
    /// Integration version from the manifest
    pub hon_version: String,

    /// Version of the appliance library (this crate)
    pub library_version: String,
}

impl HonInfo {
    pub fn current() -> Self {
        Self {
            hon_version: HON_VERSION.clone(),
            library_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// What entities observe after each refresh.
#[derive(Debug, Clone)]
pub struct CoordinatorUpdate {
    /// Last successful snapshot, kept across failed refreshes
    pub snapshot: Option<Arc<ApplianceSnapshot>>,

    pub last_update_success: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("appliance {name} is not ready: {source}")]
    NotReady {
        name: String,
        #[source]
        source: ApplianceError,
    },
}

pub struct Coordinator {
    name: String,
    info: ApplianceInfo,
    appliance: Mutex<Box<dyn Appliance>>,
    update_interval: Duration,
    updates: watch::Sender<CoordinatorUpdate>,
    poll_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(appliance: Box<dyn Appliance>, update_interval: Duration) -> Self {
        let info = appliance.info().clone();
        let update_interval = if update_interval.is_zero() {
            UPDATE_INTERVAL
        } else {
            update_interval
        };
        let (updates, _) = watch::channel(CoordinatorUpdate {
            snapshot: None,
            last_update_success: true,
        });

        Self {
            name: info.unique_id.clone(),
            info,
            appliance: Mutex::new(appliance),
            update_interval,
            updates,
            poll_task: std::sync::Mutex::new(None),
        }
    }

    /// Coordinator name, the appliance unique id.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn appliance_info(&self) -> &ApplianceInfo {
        &self.info
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn current(&self) -> CoordinatorUpdate {
        self.updates.borrow().clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.updates.borrow().last_update_success
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorUpdate> {
        self.updates.subscribe()
    }

    /// Exclusive access to the appliance, for writing settings and sending commands.
    pub async fn lock_appliance(&self) -> MutexGuard<'_, Box<dyn Appliance>> {
        self.appliance.lock().await
    }

    /// Ask the appliance for fresh state and publish the result.
    ///
    /// On failure the previous snapshot stays published and entities see
    /// `last_update_success == false`.
    pub async fn refresh(&self) -> Result<(), ApplianceError> {
        let result = {
            let mut appliance = self.appliance.lock().await;
            match appliance.update().await {
                Ok(()) => Ok(ApplianceSnapshot::capture(&**appliance)),
                Err(e) => Err(e),
            }
        };

        let was_ok = self.last_update_success();
        match result {
            Ok(snapshot) => {
                if !was_ok {
                    info!("[{}] Fetching data recovered", self.name);
                }
                debug!("[{}] Refreshed appliance state", self.name);
                self.updates.send_replace(CoordinatorUpdate {
                    snapshot: Some(Arc::new(snapshot)),
                    last_update_success: true,
                });
                Ok(())
            }
            Err(e) => {
                if was_ok {
                    warn!("[{}] Error fetching data: {}", self.name, e);
                } else {
                    debug!("[{}] Still failing: {}", self.name, e);
                }
                self.updates
                    .send_modify(|update| update.last_update_success = false);
                Err(e)
            }
        }
    }

    /// Initial refresh during setup; a failure means the appliance is not ready.
    pub async fn first_refresh(&self) -> Result<(), CoordinatorError> {
        self.refresh()
            .await
            .map_err(|source| CoordinatorError::NotReady {
                name: self.name.clone(),
                source,
            })
    }

    /// Start periodic polling. Calling this on a running coordinator does nothing.
    pub fn start(self: &Arc<Self>) {
        let Ok(mut task) = self.poll_task.lock() else {
            return;
        };
        if task.is_some() {
            return;
        }

        let coordinator = Arc::downgrade(self);
        let period = self.update_interval;
        let name = self.name.clone();
        info!("[{}] Polling every {:?}", name, period);

        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(coordinator) = coordinator.upgrade() else {
                    break;
                };
                debug!("[{}] Polling appliance", name);
                // Failures are logged and published by refresh()
                let _ = coordinator.refresh().await;
            }
        }));
    }

    pub fn stop(&self) {
        if let Ok(mut task) = self.poll_task.lock() {
            if let Some(task) = task.take() {
                debug!("[{}] Stopping poll task", self.name);
                task.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.poll_task
            .lock()
            .map(|task| task.is_some())
            .unwrap_or(false)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::appliance::mock::MockAppliance;

    fn washer() -> MockAppliance {
        MockAppliance::new("aa:bb:cc", "WM")
            .with_data(json!({"attributes": {"parameters": {"machMode": "1"}}}))
    }

    #[tokio::test]
    async fn test_first_refresh_publishes_snapshot() {
        let coordinator = Coordinator::new(Box::new(washer()), UPDATE_INTERVAL);
        assert!(coordinator.current().snapshot.is_none());

        coordinator.first_refresh().await.unwrap();

        let update = coordinator.current();
        assert!(update.last_update_success);
        let snapshot = update.snapshot.unwrap();
        assert_eq!(snapshot.info.unique_id, "aa:bb:cc");
        assert_eq!(snapshot.get("machMode"), Some(json!("1")));
    }

    #[tokio::test]
    async fn test_first_refresh_failure_is_not_ready() {
        let coordinator =
            Coordinator::new(Box::new(washer().failing_next_update()), UPDATE_INTERVAL);
        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotReady { ref name, .. } if name == "aa:bb:cc"));
        assert!(!coordinator.last_update_success());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_snapshot() {
        let mut appliance = washer();
        appliance.updates = [
            Some(json!({"attributes": {"parameters": {"machMode": "1"}}})),
            None,
            Some(json!({"attributes": {"parameters": {"machMode": "2"}}})),
        ]
        .into_iter()
        .collect();

        let coordinator = Coordinator::new(Box::new(appliance), UPDATE_INTERVAL);
        let mut rx = coordinator.subscribe();

        coordinator.refresh().await.unwrap();
        assert!(coordinator.refresh().await.is_err());

        let update = rx.borrow_and_update().clone();
        assert!(!update.last_update_success);
        assert_eq!(
            update.snapshot.unwrap().get("machMode"),
            Some(json!("1"))
        );

        coordinator.refresh().await.unwrap();
        assert!(rx.has_changed().unwrap());
        let update = rx.borrow_and_update().clone();
        assert!(update.last_update_success);
        assert_eq!(
            update.snapshot.unwrap().get("machMode"),
            Some(json!("2"))
        );
    }

    #[tokio::test]
    async fn test_polling_start_stop() {
        let appliance = washer();
        let calls = appliance.update_calls.clone();
        let coordinator = Arc::new(Coordinator::new(
            Box::new(appliance),
            Duration::from_millis(10),
        ));

        coordinator.start();
        coordinator.start();
        assert!(coordinator.is_running());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(*calls.lock().unwrap() >= 2);

        coordinator.stop();
        assert!(!coordinator.is_running());
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stopped_at = *calls.lock().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock().unwrap(), stopped_at);
    }

    #[test]
    fn test_zero_interval_uses_default() {
        let coordinator = Coordinator::new(Box::new(washer()), Duration::ZERO);
        assert_eq!(coordinator.update_interval(), UPDATE_INTERVAL);
    }

    #[test]
    fn test_info_versions() {
        let info = HonInfo::current();
        assert_eq!(info.hon_version, "0.8.0");
        assert_eq!(info.library_version, env!("CARGO_PKG_VERSION"));
    }
}
