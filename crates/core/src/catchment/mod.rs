//! Walking catchment geometry.
//!
//! Every threshold tier becomes one layer: the union of a disc around each
//! selected station, with the disc radius derived from a fixed walking pace.
//! Layers come out in draw order, widest first, so nested tiers stack from the
//! outside in.

use std::sync::Arc;

use geo::MultiPolygon;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use walkshed_transit::TransitStation;

use crate::style::LayerStyle;

pub mod disc;
pub mod export;
pub mod union;

pub use disc::disc;
pub use union::{UnionFailure, UnionOutcome, try_union, union_fold, union_fold_with};

/// Tunables for turning minutes into discs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchmentParams {
    pub meters_per_minute: f64,
    /// Floor that keeps tiny thresholds visible on the map.
    pub min_radius_km: f64,
    /// Segments per disc.
    pub steps: usize,
}

impl Default for CatchmentParams {
    fn default() -> Self {
        Self {
            meters_per_minute: 80.0,
            min_radius_km: 0.1,
            steps: 64,
        }
    }
}

impl CatchmentParams {
    pub fn radius_km(&self, minutes: u32) -> f64 {
        (minutes as f64 * self.meters_per_minute / 1_000.0).max(self.min_radius_km)
    }
}

/// `max(0.1, minutes * 80 / 1000)` kilometres.
pub fn walking_radius_km(minutes: u32) -> f64 {
    CatchmentParams::default().radius_km(minutes)
}

/// One threshold tier, ready to draw.
#[derive(Debug, Clone)]
pub struct CatchmentLayer {
    pub minutes: u32,
    pub radius_km: f64,
    pub polygon: MultiPolygon,
    /// Position in draw order; 0 is drawn first (bottom).
    pub z_rank: usize,
    pub style: LayerStyle,
    /// Discs dropped because their union with the rest failed.
    pub union_failures: usize,
}

/// Threshold values in draw order: non-positive values removed, largest first.
/// Duplicates are kept.
pub fn draw_order(thresholds: &[u32]) -> Vec<u32> {
    thresholds
        .iter()
        .copied()
        .filter(|minutes| *minutes > 0)
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}

pub fn compute_layers(stations: &[Arc<dyn TransitStation>], thresholds: &[u32]) -> Vec<CatchmentLayer> {
    compute_layers_with(&CatchmentParams::default(), stations, thresholds)
}

pub fn compute_layers_with(
    params: &CatchmentParams,
    stations: &[Arc<dyn TransitStation>],
    thresholds: &[u32],
) -> Vec<CatchmentLayer> {
    let centers: Vec<_> = stations
        .iter()
        .filter_map(|station| {
            let coords = station.coords();
            if coords.is_valid() {
                Some(coords)
            } else {
                tracing::debug!("station {} has no usable coordinates", station.id());
                None
            }
        })
        .collect();

    if centers.is_empty() {
        return Vec::new();
    }

    draw_order(thresholds)
        .into_iter()
        .enumerate()
        .map(|(z_rank, minutes)| {
            let radius_km = params.radius_km(minutes);
            let discs = centers
                .iter()
                .map(|center| disc(*center, radius_km, params.steps))
                .collect();
            let outcome = union_fold(discs);

            if outcome.failures > 0 {
                tracing::warn!(
                    "{minutes} min layer is missing {} of {} discs",
                    outcome.failures,
                    centers.len()
                );
            }

            CatchmentLayer {
                minutes,
                radius_km,
                polygon: outcome.polygon,
                z_rank,
                style: LayerStyle::for_rank(z_rank),
                union_failures: outcome.failures,
            }
        })
        .collect()
}
