//! Station directory providers.

pub mod static_provider;

pub use static_provider::{StaticStationDirectory, StationImpl};
