//! Spherical great-circle projection.
//!
//! The sphere radius is the WGS84 equatorial radius, no ellipsoidal
//! correction is applied.
use crate::types::GeoPoint;

pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Normalizes a bearing into [0, 360).
///
/// `rem_euclid` is not used here: it yields 360.0 for tiny negative inputs.
pub fn normalize_bearing(bearing: f64) -> f64 {
  ((bearing % 360.0) + 360.0) % 360.0
}

/// Projects `distance` meters from `origin` along `bearing` degrees
/// (0 = north, clockwise).
///
/// Longitude is left as computed, it is not wrapped into (-180, 180].
/// Non-finite inputs propagate into the result.
pub fn project(origin: GeoPoint, bearing: f64, distance: f64) -> GeoPoint {
  let lat1 = origin.lat.to_radians();
  let lon1 = origin.lon.to_radians();
  let brg = normalize_bearing(bearing).to_radians();
  let angular_distance = distance / EARTH_RADIUS;

  let sin_lat1 = lat1.sin();
  let cos_lat1 = lat1.cos();
  let sin_d = angular_distance.sin();
  let cos_d = angular_distance.cos();

  let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * brg.cos()).asin();
  let lon2 = lon1 + (brg.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

  GeoPoint {
    lat: lat2.to_degrees(),
    lon: lon2.to_degrees(),
  }
}

#[cfg(test)]
pub mod tests {
  use super::*;
  use geo::{HaversineBearing, HaversineDistance, Point};

  const EPS: f64 = 1e-9;

  fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
  }

  #[test]
  fn test_zero_distance() {
    let origins = [
      GeoPoint::new(0.0, 0.0),
      GeoPoint::new(37.0, -122.0),
      GeoPoint::new(-33.86, 151.2),
      GeoPoint::new(89.9, 179.9),
      GeoPoint::new(-45.0, -180.0),
    ];
    for origin in origins {
      for bearing in [0.0, 45.0, 90.0, 180.0, 271.5, -30.0, 720.0] {
        let dest = project(origin, bearing, 0.0);
        assert!(close(dest.lat, origin.lat, EPS), "{origin:?} @ {bearing}");
        assert!(close(dest.lon, origin.lon, EPS), "{origin:?} @ {bearing}");
      }
    }
  }

  #[test]
  fn test_normalize_range() {
    for b in [-720.5, -360.0, -90.25, -1e-20, 0.0, 0.5, 359.75, 360.0, 1080.0] {
      let n = normalize_bearing(b);
      assert!((0.0..360.0).contains(&n), "{b} -> {n}");
    }
    assert_eq!(normalize_bearing(-90.0), 270.0);
    assert_eq!(normalize_bearing(450.0), 90.0);
    assert_eq!(normalize_bearing(360.0), 0.0);
    assert_eq!(normalize_bearing(-0.0).to_bits(), 0.0_f64.to_bits());
  }

  #[test]
  fn test_normalize_periodic() {
    for b in [0.0, 12.5, 90.25, 181.0, 359.5] {
      for k in -3..=3 {
        let shifted = b + 360.0 * k as f64;
        assert_eq!(normalize_bearing(shifted), normalize_bearing(b), "{b} + 360*{k}");
      }
    }
  }

  #[test]
  fn test_north_100m() {
    let dest = project(GeoPoint::new(37.0, -122.0), 0.0, 100.0);
    let expected = 37.0 + (100.0 / EARTH_RADIUS).to_degrees();
    assert!(close(dest.lat, expected, 1e-9));
    assert!(close(dest.lon, -122.0, 1e-12));
    assert!(close(dest.lat, 37.00090, 1e-5));
  }

  #[test]
  fn test_negative_bearing_matches_positive() {
    let home = GeoPoint::new(48.1, 11.5);
    let a = project(home, -90.0, 250.0);
    let b = project(home, 270.0, 250.0);
    assert!(close(a.lat, b.lat, EPS));
    assert!(close(a.lon, b.lon, EPS));
    assert!(a.lon < home.lon);
  }

  #[test]
  fn test_against_haversine() {
    // geo uses the mean earth radius, so distances are scaled back
    let scale = EARTH_RADIUS / 6_371_008.8;
    let home = GeoPoint::new(37.0, -122.0);
    for (bearing, distance) in [(0.0, 100.0), (45.0, 500.0), (135.0, 1200.0), (300.0, 75.0)] {
      let dest = project(home, bearing, distance);
      let p1 = Point::new(home.lon, home.lat);
      let p2 = Point::new(dest.lon, dest.lat);
      let d = p1.haversine_distance(&p2) * scale;
      assert!((d - distance).abs() / distance < 1e-5, "{bearing} {distance}: {d}");
      let brg = p1.haversine_bearing(p2);
      let diff = normalize_bearing(brg - bearing + 180.0) - 180.0;
      assert!(diff.abs() < 1e-4, "{bearing}: {brg}");
    }
  }

  #[test]
  fn test_nan_propagates() {
    let dest = project(GeoPoint::new(f64::NAN, 0.0), 0.0, 10.0);
    assert!(dest.lat.is_nan());
    let dest = project(GeoPoint::new(10.0, 0.0), 0.0, f64::INFINITY);
    assert!(!dest.is_finite());
  }
}
