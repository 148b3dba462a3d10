//! Directory data models, types, and traits.

pub mod traits;
pub mod types;

// Re-exports for convenience
pub use traits::{StationDirectory, TransitStation};
pub use types::{Coordinates, LineColor, Result, TransitError};
