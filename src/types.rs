use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

impl GeoPoint {
  pub fn new(lat: f64, lon: f64) -> Self {
    Self { lat, lon }
  }

  pub fn is_finite(&self) -> bool {
    self.lat.is_finite() && self.lon.is_finite()
  }

  /// Coordinate tuple in the (lon, lat) order used by geographic markup
  pub fn lon_lat(&self) -> (f64, f64) {
    (self.lon, self.lat)
  }
}
