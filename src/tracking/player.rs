use crate::tracking::geo::{self, LatLng};
use crate::tracking::recorder::TrackPoint;
use crate::utils::error::{MarinexError, Result};
use crate::utils::validation::validate_range;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const DEFAULT_STEP: f64 = 0.5;
pub const MIN_STEP: f64 = 0.01;
pub const MAX_STEP: f64 = 1.0;
pub const PLAYBACK_ZOOM: f64 = 14.0;
pub const LIVE_ZOOM: f64 = 15.0;
pub const LIVE_EASE_MS: u64 = 1_000;

/// 地圖相機移動指令
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraCommand {
    pub center: LatLng,
    pub zoom: f64,
    pub duration_ms: u64,
}

impl CameraCommand {
    /// Playback jumps without easing.
    pub fn playback(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            duration_ms: 0,
        }
    }

    pub fn live(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            duration_ms: LIVE_EASE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: usize,
    pub position: LatLng,
    pub bearing: f64,
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
    pub camera: Option<CameraCommand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Frame(Frame),
    Finished,
    /// Not playing.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Replays a recorded track by moving a fractional cursor over its points.
///
/// Each [`tick`](TrackPlayer::tick) advances the cursor by `step`, but never
/// past the next recorded point, so every point is emitted as a frame in
/// order. The frame at the last point is followed by [`Tick::Finished`] and
/// the cursor rewinds to the start.
#[derive(Debug, Clone)]
pub struct TrackPlayer {
    points: Vec<TrackPoint>,
    cursor: f64,
    step: f64,
    state: PlaybackState,
    follow: bool,
    zoom: f64,
    reached_end: bool,
}

impl Default for TrackPlayer {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            cursor: 0.0,
            step: DEFAULT_STEP,
            state: PlaybackState::Stopped,
            follow: true,
            zoom: PLAYBACK_ZOOM,
            reached_end: false,
        }
    }
}

impl TrackPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(step: f64) -> Result<Self> {
        let mut player = Self::default();
        player.set_step(step)?;
        Ok(player)
    }

    pub fn set_step(&mut self, step: f64) -> Result<()> {
        if !step.is_finite() || step <= 0.0 {
            return Err(MarinexError::InvalidConfigValue {
                field: "tracking.playback_step".to_string(),
                value: step.to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        // 太小的步進在整數游標上加不動，播放永遠停不下來
        validate_range("tracking.playback_step", step, MIN_STEP, MAX_STEP)?;
        self.step = step;
        Ok(())
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    /// 換路線時重設游標並停止播放
    pub fn load(&mut self, points: Vec<TrackPoint>) {
        self.points = points;
        self.stop();
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.cursor = 0.0;
        self.reached_end = false;
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != PlaybackState::Playing {
            return Tick::Idle;
        }
        if self.points.len() < 2 || self.reached_end {
            self.stop();
            tracing::debug!("Playback finished");
            return Tick::Finished;
        }

        let last = (self.points.len() - 1) as f64;
        let frame = self.frame_at(self.cursor);

        if self.cursor >= last {
            self.reached_end = true;
        } else {
            let next_point = self.cursor.floor() + 1.0;
            self.cursor = (self.cursor + self.step).min(next_point).min(last);
        }

        Tick::Frame(frame)
    }

    fn frame_at(&self, cursor: f64) -> Frame {
        let last = self.points.len() - 1;
        // 在最後一點時沿用最後一段的方位角
        let i = (cursor.floor() as usize).min(last - 1);
        let t = (cursor - i as f64).clamp(0.0, 1.0);
        let a = &self.points[i];
        let b = &self.points[i + 1];

        let position = geo::interpolate(a.position(), b.position(), t);
        let span_ms = (b.timestamp - a.timestamp).num_milliseconds() as f64;
        let timestamp = a.timestamp + Duration::milliseconds((span_ms * t).round() as i64);
        let index = if t >= 1.0 { i + 1 } else { i };

        Frame {
            index,
            position,
            bearing: geo::bearing(a.position(), b.position()),
            speed: geo::lerp(a.speed, b.speed, t),
            timestamp,
            camera: self
                .follow
                .then(|| CameraCommand::playback(position, self.zoom)),
        }
    }
}
