//! In-memory station directory loaded from a bundled file.
//!
//! Stores all stations in directory order with a lookup map and an R-tree
//! over the stations that have usable coordinates.

use std::collections::HashMap;
use std::sync::Arc;

use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::identifiers::*;
use crate::models::{traits::*, types::*};
use crate::spatial::index::{key, StationNode};

// ============================================================================
// Concrete Implementation of the Trait
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationImpl {
    pub id: StationIdentifier,
    pub name: Arc<str>,
    pub line: Arc<str>,
    pub color: LineColor,
    #[serde(default)]
    pub coords: Coordinates,
}

impl TransitStation for StationImpl {
    fn id(&self) -> &StationIdentifier {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn line(&self) -> &str {
        &self.line
    }

    fn color(&self) -> LineColor {
        self.color
    }

    fn coords(&self) -> Coordinates {
        self.coords
    }
}

// ============================================================================
// Static Directory
// ============================================================================

/// In-memory station directory with spatial indexing
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticStationDirectory {
    stations: Vec<Arc<StationImpl>>,
    station_map: HashMap<StationIdentifier, Arc<StationImpl>>,
    station_tree: Arc<RTree<StationNode>>,
}

impl StaticStationDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self {
            stations: Vec::new(),
            station_map: HashMap::new(),
            station_tree: Arc::new(RTree::new()),
        }
    }

    /// Build the directory from raw records, keeping their order.
    pub fn from_data(stations: Vec<StationImpl>) -> Result<Self> {
        let stations: Vec<Arc<StationImpl>> = stations.into_iter().map(Arc::new).collect();

        let mut station_map = HashMap::with_capacity(stations.len());
        for station in &stations {
            if station_map
                .insert(station.id.clone(), station.clone())
                .is_some()
            {
                return Err(TransitError::DuplicateStation(station.id.clone()));
            }
        }

        let nodes: Vec<StationNode> = stations
            .iter()
            .filter_map(|s| StationNode::new(s.clone()))
            .collect();

        let unplaced = stations.len() - nodes.len();
        if unplaced > 0 {
            tracing::debug!("{unplaced} stations have no usable coordinates");
        }

        Ok(Self {
            stations,
            station_map,
            station_tree: Arc::new(RTree::bulk_load(nodes)),
        })
    }

    /// Parse a JSON array of station records.
    pub fn from_json(json: &str) -> Result<Self> {
        let stations: Vec<StationImpl> = serde_json::from_str(json)?;
        Self::from_data(stations)
    }
}

impl Default for StaticStationDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl StationDirectory for StaticStationDirectory {
    fn get_station(&self, id: &StationIdentifier) -> Option<Arc<dyn TransitStation>> {
        self.station_map
            .get(id)
            .map(|s| s.clone() as Arc<dyn TransitStation>)
    }

    fn all_stations(&self) -> Vec<Arc<dyn TransitStation>> {
        self.stations
            .iter()
            .map(|s| s.clone() as Arc<dyn TransitStation>)
            .collect()
    }

    fn len(&self) -> usize {
        self.stations.len()
    }

    fn nearest_station(&self, position: Coordinates) -> Option<Arc<dyn TransitStation>> {
        if !position.is_valid() {
            return None;
        }

        self.station_tree
            .nearest_neighbor(&key(position))
            .map(|node| node.station.clone() as Arc<dyn TransitStation>)
    }
}
