pub mod export;
pub mod geo;
pub mod logbook;
pub mod map;
pub mod player;
pub mod recorder;
pub mod replay;

pub use export::ExportFormat;
pub use geo::{bearing, LatLng};
pub use logbook::{Logbook, Mode};
pub use player::{CameraCommand, Frame, Tick, TrackPlayer};
pub use recorder::{GpsTracker, TrackPoint, TrackRecorder};
pub use replay::ReplayGeolocation;
