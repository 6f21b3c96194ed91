use crate::domain::model::{NavigationPoint, NewPoint, PointKind};
use crate::domain::ports::{
    Clock, Geolocation, PositionCallback, PositionEvent, PositionFix, WatchId, WatchOptions,
};
use crate::tracking::geo::LatLng;
use crate::utils::error::{MarinexError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One sampled or manually placed position of a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: PointKind,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
}

impl TrackPoint {
    pub fn gps(fix: &PositionFix, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat: fix.latitude,
            lng: fix.longitude,
            speed: fix.speed.unwrap_or(0.0),
            timestamp,
            kind: PointKind::Gps,
            accuracy: fix.accuracy,
            heading: fix.heading,
        }
    }

    /// 手動標記的航點速度固定為 0
    pub fn waypoint(position: LatLng, kind: PointKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat: position.lat,
            lng: position.lng,
            speed: 0.0,
            timestamp,
            kind,
            accuracy: None,
            heading: None,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn to_new_point(&self) -> NewPoint {
        NewPoint {
            lat: self.lat,
            lng: self.lng,
            speed: self.speed,
            kind: self.kind,
            recorded_at: self.timestamp,
        }
    }
}

impl From<&NavigationPoint> for TrackPoint {
    fn from(point: &NavigationPoint) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            speed: point.speed.unwrap_or(0.0),
            timestamp: point.recorded_at,
            kind: point.kind,
            accuracy: None,
            heading: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub type SampleHandler = Arc<dyn Fn(TrackPoint) + Send + Sync>;

/// Owns one geolocation watch at a time and turns fixes into GPS track points.
pub struct GpsTracker<G: Geolocation> {
    geolocation: Arc<G>,
    clock: Arc<dyn Clock>,
    options: WatchOptions,
    watch: Option<WatchId>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl<G: Geolocation> GpsTracker<G> {
    pub fn new(geolocation: Arc<G>, clock: Arc<dyn Clock>, options: WatchOptions) -> Self {
        Self {
            geolocation,
            clock,
            options,
            watch: None,
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    pub fn start(&mut self, on_sample: SampleHandler) -> Result<()> {
        if self.watch.is_some() {
            tracing::debug!("GPS already watching, start ignored");
            return Ok(());
        }
        if !self.geolocation.is_supported() {
            tracing::warn!("⚠️ Geolocation is not supported on this device");
            return Err(MarinexError::Geolocation {
                message: "Geolocation is not supported".to_string(),
            });
        }

        let clock = Arc::clone(&self.clock);
        let last_error = Arc::clone(&self.last_error);
        let callback: PositionCallback = Arc::new(move |event| match event {
            PositionEvent::Fix(fix) => {
                // 座標不可用的 fix 直接略過
                if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
                    return;
                }
                *lock(&last_error) = None;
                on_sample(TrackPoint::gps(&fix, clock.now()));
            }
            PositionEvent::Error(message) => {
                tracing::error!("GPS error: {}", message);
                *lock(&last_error) = Some(message);
            }
        });

        let id = self.geolocation.watch_position(self.options, callback)?;
        tracing::info!("🛰️ GPS watch {:?} started", id);
        self.watch = Some(id);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.watch.take() {
            self.geolocation.clear_watch(id);
            tracing::info!("🛰️ GPS watch {:?} stopped", id);
        }
    }
}

impl<G: Geolocation> Drop for GpsTracker<G> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    current: Option<TrackPoint>,
    recording: bool,
    points: Vec<TrackPoint>,
}

/// Live track buffer. Cloning shares the same buffer, so one clone can feed
/// samples from the GPS callback while another inspects or saves the track.
#[derive(Debug, Clone, Default)]
pub struct TrackRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl TrackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_handler(&self) -> SampleHandler {
        let recorder = self.clone();
        Arc::new(move |point| recorder.push_sample(point))
    }

    /// Updates the current position and appends the sample while recording.
    pub fn push_sample(&self, point: TrackPoint) {
        let mut state = lock(&self.state);
        if state.recording {
            state.points.push(point.clone());
        }
        state.current = Some(point);
    }

    pub fn current_position(&self) -> Option<TrackPoint> {
        lock(&self.state).current.clone()
    }

    /// Returns `false` when already recording; the buffer is left untouched.
    pub fn start_recording(&self, keep_previous: bool) -> bool {
        let mut state = lock(&self.state);
        if state.recording {
            return false;
        }
        if !keep_previous {
            state.points.clear();
        }
        state.recording = true;
        tracing::info!("⏺️ Recording started ({} points kept)", state.points.len());
        true
    }

    pub fn pause_recording(&self) {
        let mut state = lock(&self.state);
        if state.recording {
            state.recording = false;
            tracing::info!("⏸️ Recording paused with {} points", state.points.len());
        }
    }

    pub fn is_recording(&self) -> bool {
        lock(&self.state).recording
    }

    pub fn add_waypoint(&self, position: LatLng, kind: PointKind, timestamp: DateTime<Utc>) -> Result<()> {
        if !position.is_valid() {
            return Err(MarinexError::Validation {
                message: format!("Invalid waypoint position {}, {}", position.lat, position.lng),
            });
        }
        lock(&self.state)
            .points
            .push(TrackPoint::waypoint(position, kind, timestamp));
        Ok(())
    }

    pub fn clear(&self) {
        lock(&self.state).points.clear();
    }

    pub fn points(&self) -> Vec<TrackPoint> {
        lock(&self.state).points.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct MockGeolocation {
        unsupported: bool,
        watches: AtomicUsize,
        clears: AtomicUsize,
        callback: Mutex<Option<PositionCallback>>,
    }

    impl MockGeolocation {
        fn emit(&self, event: PositionEvent) {
            let callback = self.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(event);
            }
        }
    }

    impl Geolocation for MockGeolocation {
        fn is_supported(&self) -> bool {
            !self.unsupported
        }

        fn watch_position(&self, _options: WatchOptions, callback: PositionCallback) -> Result<WatchId> {
            let id = self.watches.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            *self.callback.lock().unwrap() = Some(callback);
            Ok(WatchId(id))
        }

        fn clear_watch(&self, _id: WatchId) {
            self.clears.fetch_add(1, Ordering::SeqCst);
            *self.callback.lock().unwrap() = None;
        }
    }

    fn fix(lat: f64, lng: f64) -> PositionEvent {
        PositionEvent::Fix(PositionFix {
            latitude: lat,
            longitude: lng,
            speed: Some(2.5),
            accuracy: Some(5.0),
            heading: None,
        })
    }

    fn tracker(geo: &Arc<MockGeolocation>) -> GpsTracker<MockGeolocation> {
        let clock = Arc::new(FixedClock(Utc::now()));
        GpsTracker::new(Arc::clone(geo), clock, WatchOptions::default())
    }

    #[test]
    fn test_stop_clears_watch_once() {
        let geo = Arc::new(MockGeolocation::default());
        let mut gps = tracker(&geo);
        let recorder = TrackRecorder::new();

        gps.start(recorder.sample_handler()).unwrap();
        gps.start(recorder.sample_handler()).unwrap();
        assert_eq!(geo.watches.load(Ordering::SeqCst), 1);

        gps.stop();
        gps.stop();
        assert_eq!(geo.clears.load(Ordering::SeqCst), 1);
        assert!(!gps.is_watching());

        gps.start(recorder.sample_handler()).unwrap();
        drop(gps);
        assert_eq!(geo.clears.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsupported_geolocation() {
        let geo = Arc::new(MockGeolocation {
            unsupported: true,
            ..Default::default()
        });
        let mut gps = tracker(&geo);
        let err = gps.start(TrackRecorder::new().sample_handler()).unwrap_err();
        assert!(matches!(err, MarinexError::Geolocation { .. }));
        assert_eq!(geo.watches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_samples_recorded_only_while_recording() {
        let geo = Arc::new(MockGeolocation::default());
        let mut gps = tracker(&geo);
        let recorder = TrackRecorder::new();
        gps.start(recorder.sample_handler()).unwrap();

        geo.emit(fix(39.50, 2.60));
        assert!(recorder.is_empty());
        assert_eq!(recorder.current_position().map(|p| p.lat), Some(39.50));

        assert!(recorder.start_recording(false));
        geo.emit(fix(39.51, 2.61));
        geo.emit(fix(f64::NAN, 2.61));
        geo.emit(PositionEvent::Error("timeout".to_string()));
        assert_eq!(gps.last_error().as_deref(), Some("timeout"));
        geo.emit(fix(39.52, 2.62));

        recorder.pause_recording();
        geo.emit(fix(39.53, 2.63));

        let lats: Vec<f64> = recorder.points().iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![39.51, 39.52]);
        assert!(recorder.points().iter().all(|p| p.kind == PointKind::Gps && p.speed == 2.5));
    }

    #[test]
    fn test_double_start_recording_keeps_buffer() {
        let recorder = TrackRecorder::new();
        let now = Utc::now();
        assert!(recorder.start_recording(false));
        recorder.push_sample(TrackPoint::waypoint(LatLng::new(1.0, 1.0), PointKind::Gps, now));
        recorder.push_sample(TrackPoint::waypoint(LatLng::new(1.1, 1.1), PointKind::Gps, now));

        assert!(!recorder.start_recording(false));
        assert_eq!(recorder.len(), 2);

        recorder.pause_recording();
        assert!(recorder.start_recording(true));
        assert_eq!(recorder.len(), 2);
        recorder.pause_recording();
        assert!(recorder.start_recording(false));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_waypoints() {
        let recorder = TrackRecorder::new();
        let now = Utc::now();
        recorder
            .add_waypoint(LatLng::new(39.5, 2.6), PointKind::Anchor, now)
            .unwrap();
        assert!(recorder
            .add_waypoint(LatLng::new(120.0, 2.6), PointKind::Stop, now)
            .is_err());

        let points = recorder.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].kind, PointKind::Anchor);
        assert_eq!(points[0].speed, 0.0);
        assert_eq!(points[0].to_new_point().kind, PointKind::Anchor);

        recorder.clear();
        assert!(recorder.is_empty());
    }
}
