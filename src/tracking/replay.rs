use crate::domain::ports::{Geolocation, PositionCallback, PositionEvent, PositionFix, WatchId, WatchOptions};
use crate::utils::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// 檔案中的一筆定位紀錄
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedFix {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl From<RecordedFix> for PositionFix {
    fn from(fix: RecordedFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed: fix.speed,
            accuracy: fix.accuracy,
            heading: fix.heading,
        }
    }
}

/// Geolocation source that replays recorded fixes at the watch's sample
/// interval. Needs a running tokio runtime.
pub struct ReplayGeolocation {
    fixes: Arc<Vec<PositionFix>>,
    next_id: AtomicU64,
    watches: Mutex<HashMap<WatchId, JoinHandle<()>>>,
    done: Arc<Notify>,
}

impl ReplayGeolocation {
    pub fn new(fixes: Vec<PositionFix>) -> Self {
        Self {
            fixes: Arc::new(fixes),
            next_id: AtomicU64::new(1),
            watches: Mutex::new(HashMap::new()),
            done: Arc::new(Notify::new()),
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        let fixes: Vec<RecordedFix> = serde_json::from_slice(data)?;
        Ok(Self::new(fixes.into_iter().map(PositionFix::from).collect()))
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Resolves once a watch has delivered every fix.
    pub async fn finished(&self) {
        self.done.notified().await;
    }
}

impl Geolocation for ReplayGeolocation {
    fn is_supported(&self) -> bool {
        true
    }

    fn watch_position(&self, options: WatchOptions, callback: PositionCallback) -> Result<WatchId> {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let fixes = Arc::clone(&self.fixes);
        let done = Arc::clone(&self.done);
        let period = options.sample_interval.max(std::time::Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            for fix in fixes.iter() {
                interval.tick().await;
                callback(PositionEvent::Fix(*fix));
            }
            done.notify_one();
        });

        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle);
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        let handle = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_replays_every_fix() {
        let geo = ReplayGeolocation::from_json(
            br#"[{"lat": 39.5, "lng": 2.6, "speed": 1.2}, {"latitude": 39.6, "longitude": 2.7}]"#,
        )
        .unwrap();
        assert_eq!(geo.len(), 2);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = WatchOptions {
            sample_interval: Duration::from_millis(5),
            ..Default::default()
        };
        let id = geo
            .watch_position(
                options,
                Arc::new(move |event| {
                    if let PositionEvent::Fix(fix) = event {
                        sink.lock().unwrap().push(fix.latitude);
                    }
                }),
            )
            .unwrap();

        geo.finished().await;
        geo.clear_watch(id);
        assert_eq!(*seen.lock().unwrap(), vec![39.5, 39.6]);
    }
}
