use super::{MissionContext, ProjectedWaypoint};
use std::{error::Error, fmt::Display, io::Write};

pub const HEADER: [&str; 16] = [
  "latitude",
  "longitude",
  "altitude(m)",
  "heading(deg)",
  "curvesize(m)",
  "rotationdir",
  "gimbalmode",
  "gimbalpitchangle",
  "altitudemode",
  "speed(m/s)",
  "poi_latitude",
  "poi_longitude",
  "poi_altitude(m)",
  "poi_altitudemode",
  "photo_timeinterval",
  "photo_distinterval",
];

const CURVE_SIZE: f64 = 0.0;
const ROTATION_DIR: i32 = 0;
const GIMBAL_MODE: i32 = 0;
const GIMBAL_PITCH_ANGLE: i32 = 0;
// always absolute, there is no way to request relative altitudes
const ALTITUDE_MODE: i32 = 0;
const POI_ALTITUDE_MODE: i32 = 0;
// -1 disables interval photos
const PHOTO_TIME_INTERVAL: i32 = -1;
const PHOTO_DIST_INTERVAL: i32 = -1;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug)]
pub enum TableError {
  CSVError(csv::Error),
  IOError(std::io::Error),
}

impl Display for TableError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TableError::CSVError(err) => write!(f, "error writing waypoint table: {err}"),
      TableError::IOError(err) => write!(f, "error flushing waypoint table: {err}"),
    }
  }
}

impl Error for TableError {}

impl From<csv::Error> for TableError {
  fn from(value: csv::Error) -> Self {
    Self::CSVError(value)
  }
}

impl From<std::io::Error> for TableError {
  fn from(value: std::io::Error) -> Self {
    Self::IOError(value)
  }
}

/// One line of the waypoint table, columns in `HEADER` order
#[derive(Debug, Clone, PartialEq)]
pub struct MissionRow {
  pub latitude: f64,
  pub longitude: f64,
  pub altitude: f64,
  pub heading: f64,
  pub curve_size: f64,
  pub rotation_dir: i32,
  pub gimbal_mode: i32,
  pub gimbal_pitch_angle: i32,
  pub altitude_mode: i32,
  pub speed: f64,
  pub poi_latitude: f64,
  pub poi_longitude: f64,
  pub poi_altitude: f64,
  pub poi_altitude_mode: i32,
  pub photo_time_interval: i32,
  pub photo_dist_interval: i32,
}

fn fixed(value: f64, precision: usize) -> String {
  // keep "-0.00" out of the table
  let value = if value == 0.0 { 0.0 } else { value };
  format!("{value:.precision$}")
}

impl MissionRow {
  pub fn new(ctx: &MissionContext, wp: &ProjectedWaypoint) -> Self {
    Self {
      latitude: wp.position.lat,
      longitude: wp.position.lon,
      altitude: wp.altitude,
      heading: wp.absolute_bearing,
      curve_size: CURVE_SIZE,
      rotation_dir: ROTATION_DIR,
      gimbal_mode: GIMBAL_MODE,
      gimbal_pitch_angle: GIMBAL_PITCH_ANGLE,
      altitude_mode: ALTITUDE_MODE,
      speed: wp.speed,
      poi_latitude: ctx.home.lat,
      poi_longitude: ctx.home.lon,
      poi_altitude: ctx.poi_altitude,
      poi_altitude_mode: POI_ALTITUDE_MODE,
      photo_time_interval: PHOTO_TIME_INTERVAL,
      photo_dist_interval: PHOTO_DIST_INTERVAL,
    }
  }

  pub fn record(&self) -> [String; 16] {
    [
      fixed(self.latitude, 8),
      fixed(self.longitude, 8),
      fixed(self.altitude, 2),
      fixed(self.heading, 2),
      fixed(self.curve_size, 2),
      self.rotation_dir.to_string(),
      self.gimbal_mode.to_string(),
      self.gimbal_pitch_angle.to_string(),
      self.altitude_mode.to_string(),
      fixed(self.speed, 2),
      fixed(self.poi_latitude, 8),
      fixed(self.poi_longitude, 8),
      fixed(self.poi_altitude, 2),
      self.poi_altitude_mode.to_string(),
      self.photo_time_interval.to_string(),
      self.photo_dist_interval.to_string(),
    ]
  }
}

pub fn build_rows(ctx: &MissionContext, waypoints: &[ProjectedWaypoint]) -> Vec<MissionRow> {
  waypoints.iter().map(|wp| MissionRow::new(ctx, wp)).collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
  pub utf8_bom: bool,
}

/// Writes the header and all rows. Every field is numeric, so nothing
/// ever needs quoting.
pub fn write_table<W: Write>(rows: &[MissionRow], dst: W) -> Result<W, TableError> {
  let mut wtr = csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(dst);
  wtr.write_record(HEADER)?;
  for row in rows {
    wtr.write_record(row.record())?;
  }
  let dst = wtr.into_inner().map_err(|err| err.into_error())?;
  Ok(dst)
}

pub fn render_table(rows: &[MissionRow], opts: TableOptions) -> Result<Vec<u8>, TableError> {
  let mut buf = Vec::new();
  if opts.utf8_bom {
    buf.extend_from_slice(UTF8_BOM);
  }
  write_table(rows, buf)
}
