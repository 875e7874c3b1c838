//! Mission model: relative waypoints anchored to a home position,
//! projected once into absolute coordinates and rendered into the
//! waypoint table and the path document.
pub mod input;
pub mod path;
pub mod table;

use crate::{
  geodesy::{normalize_bearing, project},
  types::GeoPoint,
};
use path::PathDocument;
use serde::Serialize;
use table::MissionRow;

/// Altitude of the synthesized home waypoint, meters
pub const HOME_ALTITUDE: f64 = 5.0;
/// Speed of the synthesized home waypoint, m/s
pub const HOME_SPEED: f64 = 5.0;
pub const HOME_LABEL: &str = "Home";
/// Waypoint altitudes are never lower than this, meters
pub const ALTITUDE_FLOOR: f64 = 2.0;
pub const DEFAULT_POI_ALTITUDE: f64 = 1.0;
pub const DEFAULT_MISSION_NAME: &str = "Mission Path";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeWaypoint {
  /// Distance from home, meters, never negative
  pub horizontal: f64,
  /// Degrees, relative to the mission base bearing
  pub bearing: f64,
  /// Requested altitude, meters. The floor is applied at projection time.
  pub vertical: f64,
  /// m/s, never negative
  pub speed: f64,
  /// Seconds, never negative. Accepted for request compatibility, neither
  /// the waypoint table nor the path document carries it.
  pub hold_time: Option<f64>,
  pub label: Option<String>,
}

impl Default for RelativeWaypoint {
  fn default() -> Self {
    Self {
      horizontal: 0.0,
      bearing: 0.0,
      vertical: ALTITUDE_FLOOR,
      speed: 0.0,
      hold_time: None,
      label: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionContext {
  pub home: GeoPoint,
  pub base_bearing: f64,
  pub poi_altitude: f64,
  pub name: Option<String>,
  pub waypoints: Vec<RelativeWaypoint>,
}

impl MissionContext {
  pub fn name(&self) -> &str {
    self.name.as_deref().unwrap_or(DEFAULT_MISSION_NAME)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedWaypoint {
  pub position: GeoPoint,
  pub altitude: f64,
  /// Degrees in [0, 360)
  pub absolute_bearing: f64,
  pub speed: f64,
  pub label: String,
  /// 0 is home, n is the n-th input waypoint
  pub source_index: usize,
}

impl ProjectedWaypoint {
  fn home(ctx: &MissionContext) -> Self {
    Self {
      position: ctx.home,
      altitude: HOME_ALTITUDE,
      absolute_bearing: normalize_bearing(ctx.base_bearing),
      speed: HOME_SPEED,
      label: HOME_LABEL.to_owned(),
      source_index: 0,
    }
  }

  fn from_relative(ctx: &MissionContext, idx: usize, wp: &RelativeWaypoint) -> Self {
    let absolute_bearing = normalize_bearing(ctx.base_bearing + wp.bearing);
    // every waypoint is measured from home, never from the previous one
    let position = project(ctx.home, absolute_bearing, wp.horizontal.max(0.0));
    let label = match &wp.label {
      Some(label) => label.clone(),
      None => format!("WP {idx}"),
    };

    Self {
      position,
      altitude: wp.vertical.max(ALTITUDE_FLOOR),
      absolute_bearing,
      speed: wp.speed.max(0.0),
      label,
      source_index: idx,
    }
  }
}

/// Home first, then one entry per input waypoint in input order.
pub fn project_waypoints(ctx: &MissionContext) -> Vec<ProjectedWaypoint> {
  let mut res = Vec::with_capacity(ctx.waypoints.len() + 1);
  res.push(ProjectedWaypoint::home(ctx));
  for (idx, wp) in ctx.waypoints.iter().enumerate() {
    res.push(ProjectedWaypoint::from_relative(ctx, idx + 1, wp));
  }
  res
}

/// A mission with its projection computed exactly once. Both output
/// artifacts are derived from the same projected list.
#[derive(Debug, Clone)]
pub struct Mission {
  ctx: MissionContext,
  waypoints: Vec<ProjectedWaypoint>,
}

impl Mission {
  pub fn new(ctx: MissionContext) -> Self {
    let waypoints = project_waypoints(&ctx);
    Self { ctx, waypoints }
  }

  pub fn context(&self) -> &MissionContext {
    &self.ctx
  }

  pub fn waypoints(&self) -> &[ProjectedWaypoint] {
    &self.waypoints
  }

  pub fn rows(&self) -> Vec<MissionRow> {
    table::build_rows(&self.ctx, &self.waypoints)
  }

  pub fn path_document(&self) -> PathDocument {
    path::build_document(&self.ctx, &self.waypoints)
  }
}
