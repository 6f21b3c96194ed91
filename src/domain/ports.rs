use crate::domain::model::{NavigationRoute, NewPoint, NewRoute, TokenPair};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// 匯出檔與 fix 檔的讀寫
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Persisted login session (access and refresh tokens).
pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn store_tokens(&self, tokens: &TokenPair) -> Result<()>;
    fn store_access(&self, access: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
    pub sample_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
            sample_interval: Duration::from_millis(1_000),
        }
    }
}

/// 定位感測器回報的單次位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub accuracy: Option<f64>,
    pub heading: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(PositionFix),
    Error(String),
}

pub type PositionCallback = Arc<dyn Fn(PositionEvent) + Send + Sync>;

/// Device position source. `watch_position` keeps invoking the callback
/// until the returned handle is passed to `clear_watch`.
pub trait Geolocation: Send + Sync {
    fn is_supported(&self) -> bool;
    fn watch_position(&self, options: WatchOptions, callback: PositionCallback) -> Result<WatchId>;
    fn clear_watch(&self, id: WatchId);
}

/// Server side storage of logbook routes.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn list_routes(&self, boat_id: Uuid) -> Result<Vec<NavigationRoute>>;
    async fn create_route(&self, boat_id: Uuid, route: &NewRoute) -> Result<NavigationRoute>;
    async fn add_point(&self, route_id: Uuid, point: &NewPoint) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
