//! # walkshed-transit
//!
//! Static station directory for the walkshed catchment engine.
//!
//! ## Features
//!
//! - **Immutable directory**: stations are loaded once and shared through `Arc`s
//! - **Spatial queries**: R-tree candidate search refined with Haversine distance
//! - **JSON loading**: the bundled directory format is a plain array of stations
//!
//! ## Example
//!
//! ```
//! use walkshed_transit::prelude::*;
//!
//! let taipei_main = StationImpl {
//!     id: StationIdentifier::new("R10"),
//!     name: "台北車站".into(),
//!     line: "淡水信義線".into(),
//!     color: LineColor::Red,
//!     coords: Coordinates::new(25.0478, 121.5170),
//! };
//!
//! let directory = StaticStationDirectory::from_data(vec![taipei_main]).unwrap();
//!
//! // Someone standing a few blocks north of the station
//! let nearest = directory.nearest_station(Coordinates::new(25.0520, 121.5175));
//! assert_eq!(nearest.unwrap().id().as_str(), "R10");
//! ```

pub mod identifiers;
pub mod models;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{traits::*, types::*};
    pub use crate::provider::{static_provider::StaticStationDirectory, StationImpl};
}

pub use prelude::*;
