use super::{MissionContext, RelativeWaypoint, ALTITUDE_FLOOR, DEFAULT_POI_ALTITUDE};
use crate::types::GeoPoint;
use serde::Deserialize;
use serde_json::Value;
use std::{error::Error, fmt::Display};

/// Request body as submitted by the client. Everything is kept loosely
/// typed here and normalised when converted into a `MissionContext`.
#[derive(Deserialize, Debug, Default)]
pub struct MissionRequest {
  pub init_lat: Option<Value>,
  pub init_lon: Option<Value>,
  pub init_bearing: Option<Value>,
  pub poi_altitude: Option<Value>,
  pub name: Option<Value>,
  pub waypoints: Option<Value>,
}

#[derive(Debug)]
pub enum InputError {
  Json(serde_json::Error),
  MissingWaypoints,
  WaypointsNotSequence,
  EmptyWaypoints,
  InvalidHome(&'static str),
  LatitudeOutOfRange(f64),
}

impl Display for InputError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      InputError::Json(err) => write!(f, "error parsing request body: {err}"),
      InputError::MissingWaypoints => write!(f, "missing waypoints array"),
      InputError::WaypointsNotSequence => write!(f, "waypoints must be an array"),
      InputError::EmptyWaypoints => write!(f, "waypoints array is empty"),
      InputError::InvalidHome(field) => write!(f, "missing or invalid {field}"),
      InputError::LatitudeOutOfRange(lat) => {
        write!(f, "init_lat {lat} is outside of [-90, 90]")
      }
    }
  }
}

impl Error for InputError {}

impl From<serde_json::Error> for InputError {
  fn from(value: serde_json::Error) -> Self {
    Self::Json(value)
  }
}

/// Reads a number the way a lenient client-side coercion would: JSON
/// numbers and numeric strings are accepted, anything else (including
/// non-finite values) counts as absent.
pub fn lenient_f64(value: Option<&Value>) -> Option<f64> {
  let v = match value? {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }?;
  if v.is_finite() {
    Some(v)
  } else {
    None
  }
}

fn lenient_string(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    _ => None,
  }
}

impl From<&Value> for RelativeWaypoint {
  fn from(src: &Value) -> Self {
    // Malformed fields fall back to defaults so that one bad waypoint
    // does not abort the whole mission
    let horizontal = lenient_f64(src.get("horizontal")).unwrap_or(0.0).max(0.0);
    let bearing = lenient_f64(src.get("bearing")).unwrap_or(0.0);
    let vertical = lenient_f64(src.get("vertical")).unwrap_or(ALTITUDE_FLOOR);
    let speed = lenient_f64(src.get("speed")).unwrap_or(0.0).max(0.0);
    let hold_time = lenient_f64(src.get("hold_time")).map(|t| t.max(0.0));
    let label = lenient_string(src.get("label"));

    Self {
      horizontal,
      bearing,
      vertical,
      speed,
      hold_time,
      label,
    }
  }
}

fn home_coordinate(value: Option<&Value>, field: &'static str) -> Result<f64, InputError> {
  lenient_f64(value).ok_or(InputError::InvalidHome(field))
}

impl TryFrom<MissionRequest> for MissionContext {
  type Error = InputError;

  fn try_from(src: MissionRequest) -> Result<Self, Self::Error> {
    let waypoints = match src.waypoints {
      None => return Err(InputError::MissingWaypoints),
      Some(Value::Array(items)) => items,
      Some(_) => return Err(InputError::WaypointsNotSequence),
    };
    if waypoints.is_empty() {
      return Err(InputError::EmptyWaypoints);
    }

    let lat = home_coordinate(src.init_lat.as_ref(), "init_lat")?;
    let lon = home_coordinate(src.init_lon.as_ref(), "init_lon")?;
    if !(-90.0..=90.0).contains(&lat) {
      return Err(InputError::LatitudeOutOfRange(lat));
    }

    let base_bearing = lenient_f64(src.init_bearing.as_ref()).unwrap_or(0.0);
    let poi_altitude = lenient_f64(src.poi_altitude.as_ref()).unwrap_or(DEFAULT_POI_ALTITUDE);

    Ok(Self {
      home: GeoPoint::new(lat, lon),
      base_bearing,
      poi_altitude,
      name: lenient_string(src.name.as_ref()),
      waypoints: waypoints.iter().map(RelativeWaypoint::from).collect(),
    })
  }
}

/// Parses and validates a raw request body. Validation failures are
/// reported before any output is produced.
pub fn parse_mission(body: &[u8]) -> Result<MissionContext, InputError> {
  let req: MissionRequest = serde_json::from_slice(body)?;
  req.try_into()
}
