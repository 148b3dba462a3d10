pub mod analysis;
pub mod app;
pub mod catchment;
pub mod config;
pub mod locate;
pub mod map;
pub mod state;
pub mod style;

pub use app::App;
pub use config::{TileSourceConfig, WalkshedConfig};

// Re-export the directory crate
pub use walkshed_transit as transit;
