//! Map rendering and interaction.
//!
//! [`MapView`] draws externally owned state onto a [`MapSurface`]: one marker
//! per station (created once, restyled in place) and the catchment overlays,
//! which are thrown away and rebuilt on every render. It never owns the
//! selection; clicks come back out as [`MapEvent`]s.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use geo::Rect;
use walkshed_transit::{Coordinates, StationIdentifier, TransitStation};

use crate::catchment::{CatchmentLayer, CatchmentParams, compute_layers_with};
use crate::state::SelectionSet;
use crate::style::MarkerStyle;

pub mod viewport;

pub use viewport::{ViewportChange, ViewportConfig};

/// Opaque id of a marker owned by the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceError {
    #[error("marker rejected: {0}")]
    MarkerRejected(String),
}

pub struct MarkerSpec<'a> {
    pub station_id: &'a StationIdentifier,
    pub position: Coordinates,
    pub tooltip: &'a str,
    pub style: MarkerStyle,
}

/// Imperative map-library handle.
pub trait MapSurface {
    fn add_marker(&mut self, spec: MarkerSpec<'_>) -> Result<MarkerHandle, SurfaceError>;
    fn set_marker_style(&mut self, marker: MarkerHandle, style: &MarkerStyle);
    fn bring_to_front(&mut self, marker: MarkerHandle);
    fn close_tooltip(&mut self, marker: MarkerHandle);

    /// Remove every catchment overlay.
    fn clear_overlays(&mut self);
    /// Overlays are added bottom to top.
    fn add_overlay(&mut self, layer: &CatchmentLayer);

    fn fly_to(&mut self, center: Coordinates, zoom: f64, duration: Duration);
    fn fit_bounds(&mut self, bounds: Rect);

    /// Called once a batch of changes is complete.
    fn flush(&mut self) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapEvent {
    ToggleStation(StationIdentifier),
}

struct PlacedMarker {
    handle: MarkerHandle,
    position: Coordinates,
}

pub struct MapView<S> {
    surface: S,
    markers: HashMap<StationIdentifier, PlacedMarker>,
    stations_by_marker: HashMap<MarkerHandle, StationIdentifier>,
    catchment: CatchmentParams,
    viewport: ViewportConfig,
}

impl<S: MapSurface> MapView<S> {
    pub fn new(surface: S, catchment: CatchmentParams, viewport: ViewportConfig) -> Self {
        Self {
            surface,
            markers: HashMap::new(),
            stations_by_marker: HashMap::new(),
            catchment,
            viewport,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn marker_for(&self, id: &StationIdentifier) -> Option<MarkerHandle> {
        self.markers.get(id).map(|m| m.handle)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Create markers for stations seen for the first time.
    pub fn sync_markers(&mut self, stations: &[Arc<dyn TransitStation>]) {
        for station in stations {
            if self.markers.contains_key(station.id()) {
                continue;
            }

            let position = station.coords();
            if !position.is_valid() {
                tracing::debug!("no marker for {}: invalid coordinates", station.id());
                continue;
            }

            let spec = MarkerSpec {
                station_id: station.id(),
                position,
                tooltip: station.name(),
                style: MarkerStyle::unselected(station.color()),
            };

            match self.surface.add_marker(spec) {
                Ok(handle) => {
                    self.stations_by_marker.insert(handle, station.id().clone());
                    self.markers
                        .insert(station.id().clone(), PlacedMarker { handle, position });
                }
                Err(error) => {
                    tracing::warn!("failed to create marker for station {}: {error}", station.name());
                }
            }
        }
    }

    /// Restyle markers and rebuild the catchment overlays.
    ///
    /// `stations` is the whole directory, `selected` the resolved selection.
    pub fn render(
        &mut self,
        stations: &[Arc<dyn TransitStation>],
        selection: &SelectionSet,
        selected: &[Arc<dyn TransitStation>],
        thresholds: &[u32],
    ) -> Vec<CatchmentLayer> {
        for station in stations {
            let Some(marker) = self.markers.get(station.id()) else {
                continue;
            };
            let is_selected = selection.contains(station.id());
            let style = MarkerStyle::for_selection(station.color(), is_selected);

            self.surface.set_marker_style(marker.handle, &style);
            if is_selected {
                self.surface.bring_to_front(marker.handle);
            } else {
                self.surface.close_tooltip(marker.handle);
            }
        }

        self.surface.clear_overlays();
        let layers = compute_layers_with(&self.catchment, selected, thresholds);
        for layer in &layers {
            self.surface.add_overlay(layer);
        }

        self.surface.flush();
        layers
    }

    /// Move the camera to show the selection.
    pub fn fit_selection(&mut self, selected: &[Arc<dyn TransitStation>]) -> ViewportChange {
        let valid: Vec<_> = selected.iter().filter(|s| s.coords().is_valid()).collect();

        let focus = match valid.as_slice() {
            [only] => Some(only.coords()),
            _ => None,
        };
        let markers: Vec<Coordinates> = valid
            .iter()
            .filter_map(|s| self.markers.get(s.id()).map(|m| m.position))
            .collect();

        let change = if valid.is_empty() {
            ViewportChange::Unchanged
        } else {
            viewport::plan(&self.viewport, focus, &markers)
        };

        match change {
            ViewportChange::FlyTo {
                center,
                zoom,
                duration,
            } => self.surface.fly_to(center, zoom, duration),
            ViewportChange::Fit(bounds) => self.surface.fit_bounds(bounds),
            ViewportChange::Unchanged => {
                tracing::debug!("viewport left as is");
            }
        }

        self.surface.flush();
        change
    }

    pub fn handle_click(&self, marker: MarkerHandle) -> Option<MapEvent> {
        self.stations_by_marker
            .get(&marker)
            .map(|id| MapEvent::ToggleStation(id.clone()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        AddMarker(StationIdentifier),
        Style(MarkerHandle, f32),
        Front(MarkerHandle),
        CloseTooltip(MarkerHandle),
        ClearOverlays,
        Overlay { minutes: u32, z_rank: usize },
        FlyTo(Coordinates, f64),
        Fit(Rect),
    }

    /// Surface that records every call.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub calls: Vec<Call>,
        pub reject: Vec<StationIdentifier>,
        next: u64,
    }

    impl RecordingSurface {
        pub fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl MapSurface for RecordingSurface {
        fn add_marker(&mut self, spec: MarkerSpec<'_>) -> Result<MarkerHandle, SurfaceError> {
            if self.reject.contains(spec.station_id) {
                return Err(SurfaceError::MarkerRejected("test".into()));
            }
            self.calls.push(Call::AddMarker(spec.station_id.clone()));
            self.next += 1;
            Ok(MarkerHandle(self.next))
        }

        fn set_marker_style(&mut self, marker: MarkerHandle, style: &MarkerStyle) {
            self.calls.push(Call::Style(marker, style.radius_px));
        }

        fn bring_to_front(&mut self, marker: MarkerHandle) {
            self.calls.push(Call::Front(marker));
        }

        fn close_tooltip(&mut self, marker: MarkerHandle) {
            self.calls.push(Call::CloseTooltip(marker));
        }

        fn clear_overlays(&mut self) {
            self.calls.push(Call::ClearOverlays);
        }

        fn add_overlay(&mut self, layer: &CatchmentLayer) {
            self.calls.push(Call::Overlay {
                minutes: layer.minutes,
                z_rank: layer.z_rank,
            });
        }

        fn fly_to(&mut self, center: Coordinates, zoom: f64, _duration: Duration) {
            self.calls.push(Call::FlyTo(center, zoom));
        }

        fn fit_bounds(&mut self, bounds: Rect) {
            self.calls.push(Call::Fit(bounds));
        }
    }
}
