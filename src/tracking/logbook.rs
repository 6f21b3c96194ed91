use crate::config::TrackingConfig;
use crate::domain::model::{NavigationRoute, NewRoute, PointKind};
use crate::domain::ports::{Clock, Geolocation, RouteRepository};
use crate::tracking::geo::LatLng;
use crate::tracking::map::{self, FitBounds, Marker};
use crate::tracking::player::{CameraCommand, Tick, TrackPlayer};
use crate::tracking::recorder::{GpsTracker, TrackPoint, TrackRecorder};
use crate::utils::error::{MarinexError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Live,
    History,
}

/// A boat's navigation logbook: live recording with the GPS, or history
/// browsing and playback of saved routes. Only one of the two runs at a time.
pub struct Logbook<G: Geolocation> {
    boat_id: Uuid,
    routes: Arc<dyn RouteRepository>,
    gps: GpsTracker<G>,
    recorder: TrackRecorder,
    player: TrackPlayer,
    clock: Arc<dyn Clock>,
    mode: Mode,
    live_zoom: f64,
    route_list: Vec<NavigationRoute>,
    date_filter: Option<String>,
    selected: Option<Uuid>,
}

impl<G: Geolocation> Logbook<G> {
    pub fn new(
        boat_id: Uuid,
        routes: Arc<dyn RouteRepository>,
        geolocation: Arc<G>,
        clock: Arc<dyn Clock>,
        config: &TrackingConfig,
    ) -> Result<Self> {
        let mut player = TrackPlayer::with_step(config.playback_step)?;
        player.set_follow(config.follow);
        player.set_zoom(config.playback_zoom);

        Ok(Self {
            boat_id,
            routes,
            gps: GpsTracker::new(geolocation, Arc::clone(&clock), config.watch_options()),
            recorder: TrackRecorder::new(),
            player,
            clock,
            mode: Mode::Live,
            live_zoom: config.live_zoom,
            route_list: Vec::new(),
            date_filter: None,
            selected: None,
        })
    }

    pub fn boat_id(&self) -> Uuid {
        self.boat_id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 進入即時模式會啟動 GPS 並停止播放；進入歷史模式會停止 GPS 並載入路線
    pub async fn set_mode(&mut self, mode: Mode) -> Result<()> {
        match mode {
            Mode::Live => {
                self.player.stop();
                self.mode = Mode::Live;
                self.gps.start(self.recorder.sample_handler())?;
            }
            Mode::History => {
                self.gps.stop();
                self.recorder.pause_recording();
                self.mode = Mode::History;
                self.load_routes().await?;
            }
        }
        tracing::info!("🧭 Logbook switched to {:?} mode", self.mode);
        Ok(())
    }

    pub fn is_gps_active(&self) -> bool {
        self.gps.is_watching()
    }

    pub fn gps_error(&self) -> Option<String> {
        self.gps.last_error()
    }

    // ---------- history ----------

    pub async fn load_routes(&mut self) -> Result<&[NavigationRoute]> {
        self.route_list = self.routes.list_routes(self.boat_id).await?;
        self.date_filter = None;
        self.selected = None;
        tracing::info!("📚 Loaded {} routes", self.route_list.len());
        Ok(&self.route_list)
    }

    pub fn all_routes(&self) -> &[NavigationRoute] {
        &self.route_list
    }

    /// Routes matching the current date filter, or all of them.
    pub fn routes(&self) -> Vec<&NavigationRoute> {
        self.route_list
            .iter()
            .filter(|r| match &self.date_filter {
                Some(day) => r.start_day().as_deref() == Some(day.as_str()),
                None => true,
            })
            .collect()
    }

    /// Distinct `YYYY-MM-DD` start dates, sorted.
    pub fn days_with_routes(&self) -> Vec<String> {
        self.route_list
            .iter()
            .filter_map(NavigationRoute::start_day)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter_by_date(&mut self, day: &str) -> Result<usize> {
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| MarinexError::Validation {
            message: format!("Invalid date '{}': {}", day, e),
        })?;
        self.date_filter = Some(day.to_string());
        self.selected = None;
        Ok(self.routes().len())
    }

    pub fn clear_filter(&mut self) {
        self.date_filter = None;
    }

    pub fn date_filter(&self) -> Option<&str> {
        self.date_filter.as_deref()
    }

    pub fn select_route(&mut self, route_id: Uuid) -> Result<&NavigationRoute> {
        let route = self
            .route_list
            .iter()
            .find(|r| r.id == route_id)
            .ok_or_else(|| MarinexError::Validation {
                message: format!("Route {} is not in the logbook", route_id),
            })?;

        self.player
            .load(route.points.iter().map(TrackPoint::from).collect());
        self.selected = Some(route_id);
        tracing::debug!("Selected route {} with {} points", route_id, route.points.len());
        Ok(route)
    }

    pub fn selected_route(&self) -> Option<&NavigationRoute> {
        let id = self.selected?;
        self.route_list.iter().find(|r| r.id == id)
    }

    pub fn player(&self) -> &TrackPlayer {
        &self.player
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.player.set_follow(follow);
    }

    pub fn play(&mut self) -> Result<()> {
        if self.mode != Mode::History {
            return Err(MarinexError::Validation {
                message: "Playback is only available in history mode".to_string(),
            });
        }
        self.player.play();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    pub fn tick(&mut self) -> Tick {
        self.player.tick()
    }

    // ---------- live ----------

    pub fn recorder(&self) -> &TrackRecorder {
        &self.recorder
    }

    pub fn start_recording(&mut self, keep_previous: bool) -> Result<bool> {
        if self.mode != Mode::Live {
            return Err(MarinexError::Validation {
                message: "Recording is only available in live mode".to_string(),
            });
        }
        Ok(self.recorder.start_recording(keep_previous))
    }

    pub fn pause_recording(&mut self) {
        self.recorder.pause_recording();
    }

    pub fn add_waypoint(&mut self, position: LatLng, kind: PointKind) -> Result<()> {
        self.recorder.add_waypoint(position, kind, self.clock.now())
    }

    /// 即時模式下跟隨目前位置
    pub fn live_camera(&self) -> Option<CameraCommand> {
        if self.mode != Mode::Live || !self.player.follow() {
            return None;
        }
        self.recorder
            .current_position()
            .filter(|p| p.position().is_valid())
            .map(|p| CameraCommand::live(p.position(), self.live_zoom))
    }

    /// Saves the recorded track as a new route, then clears the buffer and
    /// switches to history mode.
    pub async fn save_live_route(&mut self, name: &str) -> Result<NavigationRoute> {
        let points = self.recorder.points();
        let Some(first) = points.first() else {
            return Err(too_short(0));
        };
        if points.len() < 2 {
            return Err(too_short(points.len()));
        }

        let now = self.clock.now();
        let name = match name.trim() {
            "" => format!("Route {}", now.format("%Y-%m-%d")),
            trimmed => trimmed.to_string(),
        };
        let new_route = NewRoute {
            name,
            start_time: first.timestamp,
            end_time: now,
        };

        let route = self.routes.create_route(self.boat_id, &new_route).await?;
        for point in &points {
            self.routes.add_point(route.id, &point.to_new_point()).await?;
        }
        tracing::info!("💾 Saved route '{}' with {} points", new_route.name, points.len());

        self.recorder.clear();
        self.recorder.pause_recording();
        self.gps.stop();
        self.mode = Mode::History;
        if let Err(e) = self.load_routes().await {
            tracing::warn!("Route saved but the route list could not be reloaded: {}", e);
        }
        Ok(route)
    }

    // ---------- map ----------

    pub fn visible_points(&self) -> Vec<TrackPoint> {
        match self.mode {
            Mode::Live => self.recorder.points(),
            Mode::History => self.player.points().to_vec(),
        }
    }

    pub fn markers(&self) -> Vec<Marker> {
        map::route_markers(&self.visible_points(), self.mode)
    }

    /// 只在歷史模式且尚未開始播放時框選整條路線
    pub fn fit_bounds(&self) -> Option<FitBounds> {
        if self.player.is_playing() || self.player.cursor() > 0.0 {
            return None;
        }
        map::fit_bounds(&self.visible_points(), self.mode)
    }
}

fn too_short(len: usize) -> MarinexError {
    MarinexError::Validation {
        message: format!("Route too short: {} point(s), at least 2 are needed", len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{NavigationPoint, NewPoint};
    use crate::domain::ports::{PositionCallback, PositionEvent, PositionFix, WatchId, WatchOptions};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StepClock {
        start: DateTime<Utc>,
        calls: AtomicUsize,
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as i64;
            self.start + Duration::seconds(n)
        }
    }

    #[derive(Default)]
    struct FakeGps {
        clears: AtomicUsize,
        callback: Mutex<Option<PositionCallback>>,
    }

    impl FakeGps {
        fn fix(&self, lat: f64, lng: f64) {
            let callback = self.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                callback(PositionEvent::Fix(PositionFix {
                    latitude: lat,
                    longitude: lng,
                    speed: Some(3.0),
                    accuracy: None,
                    heading: None,
                }));
            }
        }
    }

    impl Geolocation for FakeGps {
        fn is_supported(&self) -> bool {
            true
        }

        fn watch_position(&self, _options: WatchOptions, callback: PositionCallback) -> Result<WatchId> {
            *self.callback.lock().unwrap() = Some(callback);
            Ok(WatchId(1))
        }

        fn clear_watch(&self, _id: WatchId) {
            self.clears.fetch_add(1, Ordering::SeqCst);
            *self.callback.lock().unwrap() = None;
        }
    }

    #[derive(Default)]
    struct FakeRoutes {
        routes: Mutex<Vec<NavigationRoute>>,
        created: Mutex<Vec<NewRoute>>,
        points: Mutex<Vec<(Uuid, NewPoint)>>,
    }

    #[async_trait]
    impl RouteRepository for FakeRoutes {
        async fn list_routes(&self, _boat_id: Uuid) -> Result<Vec<NavigationRoute>> {
            Ok(self.routes.lock().unwrap().clone())
        }

        async fn create_route(&self, boat_id: Uuid, route: &NewRoute) -> Result<NavigationRoute> {
            self.created.lock().unwrap().push(route.clone());
            let saved = NavigationRoute {
                id: Uuid::new_v4(),
                account: None,
                boat: Some(boat_id),
                name: Some(route.name.clone()),
                start_time: Some(route.start_time),
                end_time: Some(route.end_time),
                points: Vec::new(),
            };
            self.routes.lock().unwrap().push(saved.clone());
            Ok(saved)
        }

        async fn add_point(&self, route_id: Uuid, point: &NewPoint) -> Result<()> {
            self.points.lock().unwrap().push((route_id, point.clone()));
            Ok(())
        }
    }

    fn saved_route(day: u32, n: usize) -> NavigationRoute {
        let start = Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).unwrap();
        NavigationRoute {
            id: Uuid::new_v4(),
            account: None,
            boat: None,
            name: None,
            start_time: Some(start),
            end_time: None,
            points: (0..n)
                .map(|i| NavigationPoint {
                    id: None,
                    lat: 39.5 + i as f64 * 0.01,
                    lng: 2.6,
                    speed: Some(1.0),
                    kind: PointKind::Gps,
                    recorded_at: start + Duration::minutes(i as i64),
                })
                .collect(),
        }
    }

    fn logbook(routes: Arc<FakeRoutes>, gps: Arc<FakeGps>) -> Logbook<FakeGps> {
        let clock = Arc::new(StepClock {
            start: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            calls: AtomicUsize::new(0),
        });
        Logbook::new(Uuid::new_v4(), routes, gps, clock, &TrackingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_save_live_route_posts_points_in_order() {
        let routes = Arc::new(FakeRoutes::default());
        let gps = Arc::new(FakeGps::default());
        let mut book = logbook(Arc::clone(&routes), Arc::clone(&gps));

        book.set_mode(Mode::Live).await.unwrap();
        assert!(book.start_recording(false).unwrap());
        gps.fix(39.50, 2.60);
        book.add_waypoint(LatLng::new(39.505, 2.605), PointKind::Anchor).unwrap();
        gps.fix(39.51, 2.61);
        assert!(book.live_camera().is_some());

        let route = book.save_live_route("  Cabrera  ").await.unwrap();

        let created = routes.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "Cabrera");
        // 開始時間是第一個樣本，結束時間是儲存當下
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(created[0].start_time, start);
        assert_eq!(created[0].end_time, start + Duration::seconds(3));

        let posted = routes.points.lock().unwrap().clone();
        let kinds: Vec<PointKind> = posted.iter().map(|(_, p)| p.kind).collect();
        assert_eq!(kinds, vec![PointKind::Gps, PointKind::Anchor, PointKind::Gps]);
        assert!(posted.iter().all(|(id, _)| *id == route.id));
        assert_eq!(posted[1].1.speed, 0.0);

        assert!(book.recorder().is_empty());
        assert!(!book.recorder().is_recording());
        assert_eq!(book.mode(), Mode::History);
        assert!(!book.is_gps_active());
        assert_eq!(gps.clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_short_route() {
        let routes = Arc::new(FakeRoutes::default());
        let gps = Arc::new(FakeGps::default());
        let mut book = logbook(Arc::clone(&routes), Arc::clone(&gps));
        book.set_mode(Mode::Live).await.unwrap();
        book.start_recording(false).unwrap();
        gps.fix(39.50, 2.60);

        let err = book.save_live_route("short").await.unwrap_err();
        assert!(matches!(err, MarinexError::Validation { .. }));
        assert!(routes.created.lock().unwrap().is_empty());
        assert_eq!(book.recorder().len(), 1);
    }

    #[tokio::test]
    async fn test_history_filter_and_playback() {
        let routes = Arc::new(FakeRoutes::default());
        routes.routes.lock().unwrap().extend([
            saved_route(3, 3),
            saved_route(1, 1),
            saved_route(3, 0),
        ]);
        let gps = Arc::new(FakeGps::default());
        let mut book = logbook(Arc::clone(&routes), Arc::clone(&gps));

        book.set_mode(Mode::Live).await.unwrap();
        assert!(book.play().is_err());
        book.set_mode(Mode::History).await.unwrap();
        assert!(book.start_recording(false).is_err());

        assert_eq!(book.days_with_routes(), vec!["2025-06-01", "2025-06-03"]);
        assert_eq!(book.filter_by_date("2025-06-03").unwrap(), 2);
        assert!(book.filter_by_date("03/06/2025").is_err());

        let id = book.routes()[0].id;
        book.select_route(id).unwrap();
        assert!(book.fit_bounds().is_some());
        assert_eq!(book.markers().len(), 2);

        book.play().unwrap();
        let mut frames = 0;
        loop {
            match book.tick() {
                Tick::Frame(_) => frames += 1,
                Tick::Finished => break,
                Tick::Idle => panic!("unexpected idle"),
            }
        }
        assert_eq!(frames, 5);

        // 回到即時模式時播放會停止
        book.play().unwrap();
        book.tick();
        book.set_mode(Mode::Live).await.unwrap();
        assert!(!book.player().is_playing());
        assert_eq!(book.player().cursor(), 0.0);
    }
}
