use crate::domain::model::PointKind;
use crate::tracking::geo::{Bounds, LatLng};
use crate::tracking::logbook::Mode;
use crate::tracking::recorder::TrackPoint;
use serde::Serialize;
use serde_json::{json, Value};

pub const START_COLOR: &str = "#22c55e";
pub const END_COLOR: &str = "#ef4444";
pub const STOP_COLOR: &str = "#f59e0b";
pub const FIT_PADDING: u32 = 80;
pub const FIT_MAX_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerRole {
    Start,
    End,
    Stop,
}

impl MarkerRole {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerRole::Start => START_COLOR,
            MarkerRole::End => END_COLOR,
            MarkerRole::Stop => STOP_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub position: LatLng,
    pub role: MarkerRole,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitBounds {
    pub bounds: Bounds,
    pub padding: u32,
    pub max_zoom: f64,
}

fn valid_points(points: &[TrackPoint]) -> Vec<&TrackPoint> {
    points.iter().filter(|p| p.position().is_valid()).collect()
}

/// 起點綠色、終點紅色（只在歷史模式）、停泊點橘色
pub fn route_markers(points: &[TrackPoint], mode: Mode) -> Vec<Marker> {
    let valid = valid_points(points);
    let last = valid.len().saturating_sub(1);

    valid
        .iter()
        .enumerate()
        .filter_map(|(index, p)| {
            let role = if index == 0 {
                MarkerRole::Start
            } else if index == last && mode == Mode::History {
                MarkerRole::End
            } else if matches!(p.kind, PointKind::Stop | PointKind::Anchor) {
                MarkerRole::Stop
            } else {
                return None;
            };
            Some(Marker {
                index,
                position: p.position(),
                role,
                color: role.color(),
            })
        })
        .collect()
}

pub fn line_coordinates(points: &[TrackPoint]) -> Vec<[f64; 2]> {
    valid_points(points)
        .iter()
        .map(|p| p.position().to_lng_lat())
        .collect()
}

/// GeoJSON feature for the route line layer.
pub fn route_feature(points: &[TrackPoint]) -> Value {
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "LineString",
            "coordinates": line_coordinates(points),
        }
    })
}

/// Only history routes with more than one valid point are framed.
pub fn fit_bounds(points: &[TrackPoint], mode: Mode) -> Option<FitBounds> {
    if mode != Mode::History {
        return None;
    }
    let valid = valid_points(points);
    if valid.len() < 2 {
        return None;
    }
    Bounds::of(valid.iter().map(|p| p.position())).map(|bounds| FitBounds {
        bounds,
        padding: FIT_PADDING,
        max_zoom: FIT_MAX_ZOOM,
    })
}
