//! Core traits for directory entries.
//!
//! These traits define the public interface for station data.
//! Implementations can be in-memory, bundled, or remote.

use std::sync::Arc;

use crate::identifiers::*;
use crate::models::types::*;

// ============================================================================
// Core Entity Traits
// ============================================================================

/// A single metro station as shown on the map
pub trait TransitStation: Send + Sync {
    fn id(&self) -> &StationIdentifier;
    fn name(&self) -> &str;

    /// Display name of the line (e.g. "淡水信義線")
    fn line(&self) -> &str;
    fn color(&self) -> LineColor;

    /// May be invalid; see [`Coordinates::is_valid`]
    fn coords(&self) -> Coordinates;
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Read-only station directory, loaded once at startup
pub trait StationDirectory: Send + Sync {
    // ---- Lookups ----
    fn get_station(&self, id: &StationIdentifier) -> Option<Arc<dyn TransitStation>>;

    // ---- Collections ----

    /// All stations, in directory order
    fn all_stations(&self) -> Vec<Arc<dyn TransitStation>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- Spatial queries ----

    /// Station with the smallest great-circle distance to `position`.
    /// Stations without valid coordinates are never returned.
    fn nearest_station(&self, position: Coordinates) -> Option<Arc<dyn TransitStation>>;
}
