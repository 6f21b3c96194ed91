use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const KNOTS_PER_MPS: f64 = 1.94;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// 地圖圖層使用 `[lng, lat]` 順序
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Initial great-circle bearing from `from` to `to`, in degrees within `[0, 360)`.
pub fn bearing(from: LatLng, to: LatLng) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta = (to.lng - from.lng).to_radians();

    let y = delta.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta.cos();

    let degrees = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid 對極小的負數會回傳 360.0
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

/// Linear interpolation between two positions; `t` is clamped to `[0, 1]`.
pub fn interpolate(a: LatLng, b: LatLng, t: f64) -> LatLng {
    let t = t.clamp(0.0, 1.0);
    LatLng::new(lerp(a.lat, b.lat, t), lerp(a.lng, b.lng, t))
}

/// Haversine distance in metres.
pub fn distance_m(a: LatLng, b: LatLng) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

pub fn path_length_m(points: &[LatLng]) -> f64 {
    points.windows(2).map(|w| distance_m(w[0], w[1])).sum()
}

pub fn speed_knots(mps: f64) -> f64 {
    mps * KNOTS_PER_MPS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    /// `None` when there is no valid position.
    pub fn of<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut valid = points.into_iter().filter(LatLng::is_valid);
        let first = valid.next()?;
        let mut bounds = Bounds {
            south_west: first,
            north_east: first,
        };
        for p in valid {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn center(&self) -> LatLng {
        interpolate(self.south_west, self.north_east, 0.5)
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&p.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&p.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = LatLng::new(39.55, 2.65);
        assert!(close(bearing(origin, LatLng::new(39.60, 2.65)), 0.0));
        assert!(close(bearing(origin, LatLng::new(39.50, 2.65)), 180.0));
        // 正東方向在赤道上剛好 90°
        assert!(close(bearing(LatLng::new(0.0, 10.0), LatLng::new(0.0, 10.1)), 90.0));
        assert!(close(bearing(LatLng::new(0.0, 10.0), LatLng::new(0.0, 9.9)), 270.0));
    }

    #[test]
    fn test_bearing_is_normalised() {
        let samples = [
            (LatLng::new(10.0, 10.0), LatLng::new(10.0001, 9.9999)),
            (LatLng::new(-33.9, 151.2), LatLng::new(-34.0, 151.1)),
            (LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0)),
        ];
        for (a, b) in samples {
            let deg = bearing(a, b);
            assert!((0.0..360.0).contains(&deg), "bearing {} out of range", deg);
        }
    }

    #[test]
    fn test_bearing_translation_invariant_for_short_legs() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(0.001, 0.001);
        let base = bearing(a, b);
        for (dlat, dlng) in [(0.01, 0.0), (0.0, 0.5), (-0.02, -0.3), (0.05, 1.0)] {
            let shifted = bearing(
                LatLng::new(a.lat + dlat, a.lng + dlng),
                LatLng::new(b.lat + dlat, b.lng + dlng),
            );
            assert!((shifted - base).abs() < 0.01, "{} vs {}", shifted, base);
        }
    }

    #[test]
    fn test_interpolate_and_bounds() {
        let a = LatLng::new(39.0, 2.0);
        let b = LatLng::new(40.0, 3.0);
        assert_eq!(interpolate(a, b, 0.5), LatLng::new(39.5, 2.5));
        assert_eq!(interpolate(a, b, 2.0), b);

        let bounds = Bounds::of([b, a, LatLng::new(f64::NAN, 0.0)]).unwrap();
        assert_eq!(bounds.south_west, a);
        assert_eq!(bounds.north_east, b);
        assert!(bounds.contains(bounds.center()));
        assert!(Bounds::of(Vec::new()).is_none());
    }

    #[test]
    fn test_distance_and_speed() {
        // 赤道上一度經度約 111.2 km
        let d = distance_m(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 50.0);
        assert!(close(speed_knots(10.0), 19.4));
        assert_eq!(path_length_m(&[LatLng::new(1.0, 1.0)]), 0.0);
    }
}
