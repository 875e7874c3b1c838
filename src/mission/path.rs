use super::{MissionContext, ProjectedWaypoint};
use crate::xml::{render_document, Element};
use serde::Serialize;
use std::fmt::Display;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
const PATH_STYLE_ID: &str = "pathStyle";
const PATH_LINE_COLOR: &str = "ff00aaff";
const PATH_LINE_WIDTH: &str = "4";
const PATH_NAME: &str = "Flight Path";
// fixed, the waypoint table uses absolute altitudes too
const ALTITUDE_MODE: &str = "absolute";

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct PathPoint {
  pub lon: f64,
  pub lat: f64,
  pub alt: f64,
}

impl Display for PathPoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{},{},{}", self.lon, self.lat, self.alt)
  }
}

impl From<&ProjectedWaypoint> for PathPoint {
  fn from(wp: &ProjectedWaypoint) -> Self {
    let (lon, lat) = wp.position.lon_lat();
    Self {
      lon,
      lat,
      alt: wp.altitude,
    }
  }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Marker {
  pub name: String,
  pub point: PathPoint,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PathDocument {
  pub name: String,
  pub polyline: Vec<PathPoint>,
  pub markers: Vec<Marker>,
}

pub fn build_document(ctx: &MissionContext, waypoints: &[ProjectedWaypoint]) -> PathDocument {
  let polyline = waypoints.iter().map(PathPoint::from).collect();
  let markers = waypoints
    .iter()
    .map(|wp| Marker {
      name: wp.label.clone(),
      point: wp.into(),
    })
    .collect();

  PathDocument {
    name: ctx.name().to_owned(),
    polyline,
    markers,
  }
}

impl PathDocument {
  fn style(&self) -> Element {
    Element::new("Style").attr("id", PATH_STYLE_ID).child(
      Element::new("LineStyle")
        .child(Element::with_text("color", PATH_LINE_COLOR))
        .child(Element::with_text("width", PATH_LINE_WIDTH)),
    )
  }

  fn path_placemark(&self) -> Element {
    let coords: Vec<String> = self.polyline.iter().map(|p| p.to_string()).collect();
    Element::new("Placemark")
      .child(Element::with_text("name", PATH_NAME))
      .child(Element::with_text("styleUrl", format!("#{PATH_STYLE_ID}")))
      .child(
        Element::new("LineString")
          .child(Element::with_text("tessellate", "1"))
          .child(Element::with_text("altitudeMode", ALTITUDE_MODE))
          .child(Element::with_text("coordinates", coords.join(" "))),
      )
  }

  fn marker_placemark(marker: &Marker) -> Element {
    Element::new("Placemark")
      .child(Element::with_text("name", marker.name.as_str()))
      .child(
        Element::new("Point")
          .child(Element::with_text("altitudeMode", ALTITUDE_MODE))
          .child(Element::with_text("coordinates", marker.point.to_string())),
      )
  }

  pub fn to_element(&self) -> Element {
    let document = Element::new("Document")
      .child(Element::with_text("name", self.name.as_str()))
      .child(self.style())
      .child(self.path_placemark())
      .children(self.markers.iter().map(Self::marker_placemark));
    Element::new("kml").attr("xmlns", KML_NAMESPACE).child(document)
  }

  pub fn render(&self) -> String {
    render_document(&self.to_element())
  }
}
