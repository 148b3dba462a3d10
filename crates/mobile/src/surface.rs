//! [`MapSurface`] that renders into GeoJSON snapshots for the host map.
//!
//! The host's MapLibre view reads the snapshots back from the overlay server;
//! nothing here touches a real map widget.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use geo::Rect;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use tokio::sync::watch;
use walkshed_core::catchment::{CatchmentLayer, export};
use walkshed_core::map::{MapSurface, MarkerHandle, MarkerSpec, SurfaceError, ViewportConfig};
use walkshed_core::style::{MarkerStyle, hex};
use walkshed_core::transit::{Coordinates, StationIdentifier};

/// Camera instruction for the host, numbered so repeats can be detected.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CameraState {
    pub sequence: u64,
    #[serde(flatten)]
    pub command: CameraCommand,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraCommand {
    Initial { center: [f64; 2], zoom: f64 },
    FlyTo { center: [f64; 2], zoom: f64, duration_ms: u64 },
    /// `[west, south, east, north]`.
    Fit { bounds: [f64; 4] },
}

/// Everything the host needs to draw one frame.
#[derive(Clone, Debug)]
pub struct OverlaySnapshot {
    pub overlays: FeatureCollection,
    pub markers: FeatureCollection,
    pub camera: CameraState,
}

impl OverlaySnapshot {
    fn empty(camera: CameraState) -> Self {
        Self {
            overlays: collection(Vec::new()),
            markers: collection(Vec::new()),
            camera,
        }
    }
}

struct PlacedMarker {
    station_id: StationIdentifier,
    name: String,
    position: Coordinates,
    style: MarkerStyle,
    tooltip_open: bool,
    sort_key: u64,
}

pub struct StyleSurface {
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, PlacedMarker>,
    overlays: Vec<Feature>,
    camera: CameraState,
    /// Highest sort key handed out; brought-to-front markers get the next one.
    front: u64,
    snapshots: watch::Sender<Arc<OverlaySnapshot>>,
}

impl StyleSurface {
    pub fn new(viewport: &ViewportConfig) -> (Self, watch::Receiver<Arc<OverlaySnapshot>>) {
        let camera = CameraState {
            sequence: 0,
            command: CameraCommand::Initial {
                center: lng_lat(viewport.initial_center),
                zoom: viewport.initial_zoom,
            },
        };
        let (snapshots, receiver) = watch::channel(Arc::new(OverlaySnapshot::empty(camera.clone())));

        let surface = Self {
            next_handle: 0,
            markers: BTreeMap::new(),
            overlays: Vec::new(),
            camera,
            front: 0,
            snapshots,
        };
        (surface, receiver)
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            overlays: collection(self.overlays.clone()),
            markers: self.marker_collection(),
            camera: self.camera.clone(),
        }
    }

    fn marker_collection(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|(handle, marker)| marker_feature(*handle, marker))
            .collect();
        collection(features)
    }

    fn set_camera(&mut self, command: CameraCommand) {
        self.camera = CameraState {
            sequence: self.camera.sequence + 1,
            command,
        };
    }
}

impl MapSurface for StyleSurface {
    fn add_marker(&mut self, spec: MarkerSpec<'_>) -> Result<MarkerHandle, SurfaceError> {
        if !spec.position.is_valid() {
            return Err(SurfaceError::MarkerRejected(format!(
                "{} has no position",
                spec.station_id
            )));
        }

        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            PlacedMarker {
                station_id: spec.station_id.clone(),
                name: spec.tooltip.to_owned(),
                position: spec.position,
                style: spec.style,
                tooltip_open: false,
                sort_key: 0,
            },
        );
        Ok(handle)
    }

    fn set_marker_style(&mut self, marker: MarkerHandle, style: &MarkerStyle) {
        if let Some(placed) = self.markers.get_mut(&marker) {
            placed.style = *style;
        }
    }

    fn bring_to_front(&mut self, marker: MarkerHandle) {
        if let Some(placed) = self.markers.get_mut(&marker) {
            self.front += 1;
            placed.sort_key = self.front;
        }
    }

    fn close_tooltip(&mut self, marker: MarkerHandle) {
        if let Some(placed) = self.markers.get_mut(&marker) {
            placed.tooltip_open = false;
        }
    }

    fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    fn add_overlay(&mut self, layer: &CatchmentLayer) {
        self.overlays.push(export::layer_to_feature(layer));
    }

    fn fly_to(&mut self, center: Coordinates, zoom: f64, duration: Duration) {
        self.set_camera(CameraCommand::FlyTo {
            center: lng_lat(center),
            zoom,
            duration_ms: duration.as_millis() as u64,
        });
    }

    fn fit_bounds(&mut self, bounds: Rect) {
        self.set_camera(CameraCommand::Fit {
            bounds: [bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y],
        });
    }

    fn flush(&mut self) {
        self.snapshots.send_replace(Arc::new(self.snapshot()));
    }
}

fn lng_lat(position: Coordinates) -> [f64; 2] {
    [position.lng, position.lat]
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn marker_feature(handle: MarkerHandle, marker: &PlacedMarker) -> Feature {
    let style = &marker.style;

    let mut properties = JsonObject::new();
    properties.insert("marker_id".to_string(), serde_json::json!(handle.0));
    properties.insert(
        "station_id".to_string(),
        serde_json::json!(marker.station_id.as_str()),
    );
    properties.insert("name".to_string(), serde_json::json!(marker.name));
    properties.insert("radius".to_string(), serde_json::json!(style.radius_px));
    properties.insert("fill".to_string(), serde_json::json!(hex(style.fill)));
    properties.insert("fill-opacity".to_string(), serde_json::json!(style.fill.alpha));
    properties.insert("stroke".to_string(), serde_json::json!(hex(style.border.color)));
    properties.insert(
        "stroke-width".to_string(),
        serde_json::json!(style.border.width_px),
    );
    properties.insert("tooltip_open".to_string(), serde_json::json!(marker.tooltip_open));
    properties.insert("sort_key".to_string(), serde_json::json!(marker.sort_key));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            marker.position.lng,
            marker.position.lat,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkshed_core::catchment::compute_layers;
    use walkshed_core::transit::{LineColor, StationImpl, TransitStation};

    fn spec<'a>(id: &'a StationIdentifier, position: Coordinates) -> MarkerSpec<'a> {
        MarkerSpec {
            station_id: id,
            position,
            tooltip: "台北車站",
            style: MarkerStyle::unselected(LineColor::Red),
        }
    }

    fn property(feature: &Feature, key: &str) -> serde_json::Value {
        feature.properties.as_ref().unwrap()[key].clone()
    }

    #[test]
    fn nothing_is_published_before_flush() {
        let (mut surface, receiver) = StyleSurface::new(&ViewportConfig::default());
        let id = StationIdentifier::new("R10");

        surface.add_marker(spec(&id, Coordinates::new(25.0478, 121.5170))).unwrap();
        assert!(receiver.borrow().markers.features.is_empty());
        assert!(matches!(
            receiver.borrow().camera.command,
            CameraCommand::Initial { zoom, .. } if zoom == 13.0
        ));

        surface.flush();
        assert_eq!(receiver.borrow().markers.features.len(), 1);
    }

    #[test]
    fn marker_features_carry_style() {
        let (mut surface, _receiver) = StyleSurface::new(&ViewportConfig::default());
        let id = StationIdentifier::new("R10");

        let handle = surface
            .add_marker(spec(&id, Coordinates::new(25.0478, 121.5170)))
            .unwrap();
        surface.set_marker_style(handle, &MarkerStyle::selected(LineColor::Red));
        surface.bring_to_front(handle);

        let snapshot = surface.snapshot();
        let feature = &snapshot.markers.features[0];
        assert_eq!(property(feature, "station_id"), "R10");
        assert_eq!(property(feature, "radius"), 9.0);
        assert_eq!(property(feature, "stroke"), "#4f46e5");
        assert_eq!(property(feature, "fill"), "#e3002c");
        assert_eq!(property(feature, "sort_key"), 1);
    }

    #[test]
    fn invalid_positions_are_rejected() {
        let (mut surface, _receiver) = StyleSurface::new(&ViewportConfig::default());
        let id = StationIdentifier::new("X");

        assert!(surface.add_marker(spec(&id, Coordinates::missing())).is_err());
    }

    #[test]
    fn overlays_are_replaced_and_camera_advances() {
        let (mut surface, receiver) = StyleSurface::new(&ViewportConfig::default());
        let station: Arc<dyn TransitStation> = Arc::new(StationImpl {
            id: StationIdentifier::new("R10"),
            name: "台北車站".into(),
            line: "淡水信義線".into(),
            color: LineColor::Red,
            coords: Coordinates::new(25.0478, 121.5170),
        });

        for layer in compute_layers(&[station.clone()], &[2, 5, 8]) {
            surface.add_overlay(&layer);
        }
        surface.fly_to(station.coords(), 14.0, Duration::from_millis(1_200));
        surface.flush();

        {
            let snapshot = receiver.borrow();
            assert_eq!(snapshot.overlays.features.len(), 3);
            assert_eq!(snapshot.camera.sequence, 1);
            assert_eq!(
                snapshot.camera.command,
                CameraCommand::FlyTo {
                    center: [121.5170, 25.0478],
                    zoom: 14.0,
                    duration_ms: 1_200,
                }
            );
        }

        surface.clear_overlays();
        surface.flush();
        assert!(receiver.borrow().overlays.features.is_empty());
    }

    #[test]
    fn camera_serializes_with_kind_tag() {
        let camera = CameraState {
            sequence: 3,
            command: CameraCommand::Fit {
                bounds: [121.5, 25.0, 121.6, 25.1],
            },
        };

        assert_eq!(
            serde_json::to_value(&camera).unwrap(),
            serde_json::json!({
                "sequence": 3,
                "kind": "fit",
                "bounds": [121.5, 25.0, 121.6, 25.1],
            })
        );
    }
}
