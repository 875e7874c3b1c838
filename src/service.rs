//! Transport independent request handling. A transport hands over the
//! request method and raw body and receives either a finished artifact or
//! a `ServiceError` carrying the status to report.
use crate::{
  config::Config,
  geodesy::{normalize_bearing, project},
  mission::{
    input::{lenient_f64, parse_mission, InputError},
    table::{render_table, TableError, TableOptions},
    Mission,
  },
  types::GeoPoint,
  util::seconds_since,
};
use chrono::Utc;
use log::{debug, error, info};
use serde_json::{json, Value};
use std::{collections::HashMap, error::Error, fmt::Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
  Table,
  Path,
}

impl Endpoint {
  pub fn content_type(&self) -> &'static str {
    match self {
      Endpoint::Table => "text/csv",
      Endpoint::Path => "application/vnd.google-earth.kml+xml",
    }
  }

  pub fn filename(&self) -> &'static str {
    match self {
      Endpoint::Table => "litchi_waypoints.csv",
      Endpoint::Path => "mission_path.kml",
    }
  }

  fn status_message(&self) -> &'static str {
    match self {
      Endpoint::Table => "csv generator active",
      Endpoint::Path => "KML generator active",
    }
  }
}

impl Display for Endpoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Endpoint::Table => write!(f, "table"),
      Endpoint::Path => write!(f, "path"),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
  pub content_type: &'static str,
  pub filename: &'static str,
  pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
  MethodNotAllowed,
  InvalidInput(String),
  Internal(String),
}

impl ServiceError {
  pub fn status(&self) -> u16 {
    match self {
      ServiceError::MethodNotAllowed => 405,
      ServiceError::InvalidInput(_) => 400,
      ServiceError::Internal(_) => 500,
    }
  }
}

impl Display for ServiceError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ServiceError::MethodNotAllowed => write!(f, "Only POST allowed"),
      ServiceError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
      ServiceError::Internal(msg) => write!(f, "Internal error: {msg}"),
    }
  }
}

impl Error for ServiceError {}

impl From<InputError> for ServiceError {
  fn from(value: InputError) -> Self {
    Self::InvalidInput(value.to_string())
  }
}

impl From<TableError> for ServiceError {
  fn from(value: TableError) -> Self {
    Self::Internal(value.to_string())
  }
}

#[derive(Debug, Clone, Default)]
pub struct MissionService {
  table: TableOptions,
}

impl MissionService {
  pub fn new(cfg: &Config) -> Self {
    Self {
      table: (&cfg.table).into(),
    }
  }

  /// Entry point for transports: only POST is accepted, the body is not
  /// looked at otherwise.
  pub fn handle(
    &self,
    endpoint: Endpoint,
    method: &str,
    body: &[u8],
  ) -> Result<Artifact, ServiceError> {
    if !method.eq_ignore_ascii_case("POST") {
      return Err(ServiceError::MethodNotAllowed);
    }
    self.generate(endpoint, body)
  }

  pub fn generate(&self, endpoint: Endpoint, body: &[u8]) -> Result<Artifact, ServiceError> {
    let t = Utc::now();
    let ctx = parse_mission(body).map_err(|err| {
      info!("rejecting {endpoint} request: {err}");
      ServiceError::from(err)
    })?;
    let mission = Mission::new(ctx);
    if mission.waypoints().iter().any(|wp| !wp.position.is_finite()) {
      error!("non-finite coordinate projected for {endpoint} request");
      return Err(ServiceError::Internal(
        "projected coordinate is not finite".to_owned(),
      ));
    }

    let body = match endpoint {
      Endpoint::Table => render_table(&mission.rows(), self.table).map_err(|err| {
        error!("error rendering waypoint table: {err}");
        ServiceError::from(err)
      })?,
      Endpoint::Path => mission.path_document().render().into_bytes(),
    };

    debug!(
      "{endpoint} generated for {} waypoints in {}s",
      mission.waypoints().len(),
      seconds_since(t)
    );
    Ok(Artifact {
      content_type: endpoint.content_type(),
      filename: endpoint.filename(),
      body,
    })
  }
}

/// JSON body of the status probe
pub fn status_body(endpoint: Endpoint) -> String {
  json!({ "status": endpoint.status_message() }).to_string()
}

/// Percent-decoded query parameters, `+` stands for a space
fn query_params(query: Option<&str>) -> HashMap<String, String> {
  form_urlencoded::parse(query.unwrap_or_default().as_bytes())
    .into_owned()
    .collect()
}

/// Single point projection, `lat`, `lon`, `bearing` and `distance` query
/// parameters. Returns `{"lat": .., "lon": ..}`.
pub fn point_body(query: Option<&str>) -> Result<String, ServiceError> {
  let params = query_params(query);
  let param = |name: &'static str| {
    let value = params.get(name).map(|v| Value::String(v.clone()));
    lenient_f64(value.as_ref())
      .ok_or_else(|| ServiceError::InvalidInput(format!("missing or invalid {name}")))
  };

  let origin = GeoPoint::new(param("lat")?, param("lon")?);
  let bearing = normalize_bearing(param("bearing")?);
  let distance = param("distance")?.max(0.0);
  let dest = project(origin, bearing, distance);
  Ok(json!({ "lat": dest.lat, "lon": dest.lon }).to_string())
}

#[cfg(test)]
pub mod tests {
  use super::*;

  const SCENARIO: &str = r#"{
    "init_lat": 37.0,
    "init_lon": -122.0,
    "init_bearing": 0,
    "waypoints": [{"horizontal": 100, "bearing": 0, "vertical": 10, "speed": 5}]
  }"#;

  fn csv_lines(artifact: &Artifact) -> Vec<Vec<String>> {
    String::from_utf8(artifact.body.clone())
      .unwrap()
      .lines()
      .map(|l| l.split(',').map(|s| s.to_owned()).collect())
      .collect()
  }

  #[test]
  fn test_method_not_allowed() {
    let svc = MissionService::default();
    for method in ["GET", "PUT", "DELETE"] {
      let res = svc.handle(Endpoint::Table, method, SCENARIO.as_bytes());
      assert_eq!(res, Err(ServiceError::MethodNotAllowed));
    }
    assert_eq!(ServiceError::MethodNotAllowed.status(), 405);
  }

  #[test]
  fn test_table_artifact() {
    let svc = MissionService::default();
    let artifact = svc.handle(Endpoint::Table, "POST", SCENARIO.as_bytes()).unwrap();
    assert_eq!(artifact.content_type, "text/csv");
    assert_eq!(artifact.filename, "litchi_waypoints.csv");
    let lines = csv_lines(&artifact);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].len(), 16);
    assert_eq!(lines[2][2], "10.00");
    assert_eq!(lines[2][3], "0.00");
    assert_eq!(lines[2][9], "5.00");
  }

  #[test]
  fn test_path_artifact() {
    let svc = MissionService::default();
    let artifact = svc.handle(Endpoint::Path, "POST", SCENARIO.as_bytes()).unwrap();
    assert_eq!(artifact.content_type, "application/vnd.google-earth.kml+xml");
    assert_eq!(artifact.filename, "mission_path.kml");
    let text = String::from_utf8(artifact.body).unwrap();
    assert!(text.contains("<name>WP 1</name>"));
    crate::xml::tests::assert_well_formed(&text);
  }

  #[test]
  fn test_outputs_consistent() {
    let body = r#"{
      "init_lat": -12.5,
      "init_lon": 130.75,
      "init_bearing": 200,
      "waypoints": [
        {"horizontal": 300, "bearing": 10, "vertical": 40, "speed": 8},
        {"horizontal": 150, "bearing": -170, "vertical": 1, "speed": 2},
        {"horizontal": 75, "bearing": 95.5, "vertical": 12}
      ]
    }"#;
    let svc = MissionService::default();
    let table = svc.handle(Endpoint::Table, "POST", body.as_bytes()).unwrap();
    let path = svc.handle(Endpoint::Path, "POST", body.as_bytes()).unwrap();
    let rows = csv_lines(&table);
    let kml = String::from_utf8(path.body).unwrap();

    let points: Vec<Vec<f64>> = kml
      .split("<Point>")
      .skip(1)
      .map(|chunk| {
        let start = chunk.find("<coordinates>").unwrap() + "<coordinates>".len();
        let end = chunk.find("</coordinates>").unwrap();
        chunk[start..end]
          .split(',')
          .map(|v| v.parse().unwrap())
          .collect()
      })
      .collect();

    assert_eq!(points.len(), rows.len() - 1);
    for (row, point) in rows.iter().skip(1).zip(points.iter()) {
      let lat: f64 = row[0].parse().unwrap();
      let lon: f64 = row[1].parse().unwrap();
      let alt: f64 = row[2].parse().unwrap();
      assert!((lat - point[1]).abs() < 1e-8);
      assert!((lon - point[0]).abs() < 1e-8);
      assert!((alt - point[2]).abs() < 1e-2);
    }
  }

  #[test]
  fn test_empty_waypoints() {
    let svc = MissionService::default();
    let body = r#"{"init_lat": 1, "init_lon": 2, "waypoints": []}"#;
    for endpoint in [Endpoint::Table, Endpoint::Path] {
      let err = svc.handle(endpoint, "POST", body.as_bytes()).unwrap_err();
      assert!(matches!(err, ServiceError::InvalidInput(_)));
      assert_eq!(err.status(), 400);
    }
  }

  #[test]
  fn test_invalid_home() {
    let svc = MissionService::default();
    let body = r#"{"init_lat": "x", "init_lon": 2, "waypoints": [{}]}"#;
    let err = svc.generate(Endpoint::Table, body.as_bytes()).unwrap_err();
    assert_eq!(
      err,
      ServiceError::InvalidInput("missing or invalid init_lat".to_owned())
    );
  }

  #[test]
  fn test_status_body() {
    let v: Value = serde_json::from_str(&status_body(Endpoint::Path)).unwrap();
    assert_eq!(v["status"], "KML generator active");
  }

  #[test]
  fn test_point_body() {
    let body = point_body(Some("lat=37&lon=-122&bearing=360&distance=100")).unwrap();
    let v: Value = serde_json::from_str(&body).unwrap();
    let lat = v["lat"].as_f64().unwrap();
    let lon = v["lon"].as_f64().unwrap();
    assert!((lat - 37.0009).abs() < 1e-5);
    assert!((lon + 122.0).abs() < 1e-9);

    let err = point_body(Some("lat=37&lon=-122&bearing=abc&distance=100")).unwrap_err();
    assert_eq!(err, ServiceError::InvalidInput("missing or invalid bearing".to_owned()));
    assert!(point_body(None).is_err());
  }

  #[test]
  fn test_point_body_decodes_query() {
    let plain = point_body(Some("lat=-37&lon=-122&bearing=90&distance=100")).unwrap();
    let encoded = point_body(Some("lat=%2D37&lon=%2d122&bearing=+90&distance=1%30%30")).unwrap();
    assert_eq!(plain, encoded);

    let params = query_params(Some("a=1+2&b=%26&c"));
    assert_eq!(params["a"], "1 2");
    assert_eq!(params["b"], "&");
    assert_eq!(params["c"], "");
  }

  #[test]
  fn test_internal_error() {
    let err = ServiceError::from(TableError::IOError(std::io::Error::new(
      std::io::ErrorKind::Other,
      "sink closed",
    )));
    assert!(matches!(err, ServiceError::Internal(_)));
    assert_eq!(err.status(), 500);
    assert!(err.to_string().starts_with("Internal error: "));
  }
}
