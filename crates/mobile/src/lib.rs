mod logging;
pub(crate) mod overlay_server;
pub mod session;
pub mod surface;

uniffi::setup_scaffolding!();

/// Install logging and route panics into it.
/// Call this once at startup from Kotlin/Swift
#[uniffi::export]
pub fn init_logging() {
    logging::setup_logging();
}
