use std::time::Duration;

use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};
use walkshed_transit::Coordinates;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub initial_center: Coordinates,
    pub initial_zoom: f64,
    /// Zoom used when a single station is selected.
    pub focus_zoom: f64,
    pub fly_duration_ms: u64,
    /// Fraction of the selection box added on every side when fitting.
    pub fit_padding: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            // Taipei Main Station
            initial_center: Coordinates::new(25.0478, 121.5170),
            initial_zoom: 13.0,
            focus_zoom: 14.0,
            fly_duration_ms: 1_200,
            fit_padding: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportChange {
    FlyTo {
        center: Coordinates,
        zoom: f64,
        duration: Duration,
    },
    /// Bounds in `x = lng, y = lat`, padding already applied.
    Fit(Rect),
    Unchanged,
}

/// Camera move for a selection.
///
/// `focus` is the single selected station (if exactly one is valid);
/// `markers` are the positions of the selected stations' markers.
pub fn plan(
    config: &ViewportConfig,
    focus: Option<Coordinates>,
    markers: &[Coordinates],
) -> ViewportChange {
    if let Some(center) = focus {
        return ViewportChange::FlyTo {
            center,
            zoom: config.focus_zoom,
            duration: Duration::from_millis(config.fly_duration_ms),
        };
    }

    match padded_bounds(markers, config.fit_padding) {
        Some(bounds) => ViewportChange::Fit(bounds),
        None => ViewportChange::Unchanged,
    }
}

/// Bounding box of `positions` grown by `padding` times its size on each
/// side. `None` when the box is empty, non-finite or collapses to a point.
pub fn padded_bounds(positions: &[Coordinates], padding: f64) -> Option<Rect> {
    let mut valid = positions.iter().filter(|p| p.is_valid());
    let first = valid.next()?;

    let (mut min, mut max) = (
        Coord { x: first.lng, y: first.lat },
        Coord { x: first.lng, y: first.lat },
    );
    for position in valid {
        min.x = min.x.min(position.lng);
        min.y = min.y.min(position.lat);
        max.x = max.x.max(position.lng);
        max.y = max.y.max(position.lat);
    }

    let width = max.x - min.x;
    let height = max.y - min.y;
    if !(width.is_finite() && height.is_finite()) || (width == 0.0 && height == 0.0) {
        return None;
    }

    let pad = Coord {
        x: width * padding,
        y: height * padding,
    };
    Some(Rect::new(min - pad, max + pad))
}
