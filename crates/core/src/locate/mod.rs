//! Device location lookup used by the "nearest station" action.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use walkshed_transit::{Coordinates, StationIdentifier};

pub const UNSUPPORTED_NOTICE: &str = "您的瀏覽器不支援地理定位功能";
pub const FAILED_NOTICE: &str = "無法獲取您的位置，請確認是否允許存取位置資訊。";

/// Options handed to the platform provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the provider may return; zero demands a fresh one.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(5_000),
            maximum_age: Duration::ZERO,
        }
    }
}

/// What to do with a fix that arrives after the user changed the selection
/// by hand while the lookup was in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleLocatePolicy {
    /// Replace the selection anyway.
    #[default]
    Apply,
    DiscardIfSelectionChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateConfig {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    pub stale_policy: StaleLocatePolicy,
}

impl Default for LocateConfig {
    fn default() -> Self {
        let options = GeolocationOptions::default();
        Self {
            enable_high_accuracy: options.enable_high_accuracy,
            timeout_ms: options.timeout.as_millis() as u64,
            maximum_age_ms: options.maximum_age.as_millis() as u64,
            stale_policy: StaleLocatePolicy::default(),
        }
    }
}

impl LocateConfig {
    pub fn options(&self) -> GeolocationOptions {
        GeolocationOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this device")]
    Unavailable,

    #[error("location permission denied")]
    Denied,

    #[error("location lookup timed out")]
    Timeout,

    #[error("location lookup failed: {0}")]
    Failed(String),
}

impl GeolocationError {
    /// Blocking notice shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::Unavailable => UNSUPPORTED_NOTICE,
            _ => FAILED_NOTICE,
        }
    }
}

/// Single-shot position source supplied by the platform.
pub trait GeolocationProvider: Send + Sync {
    fn current_position<'a>(
        &'a self,
        options: &'a GeolocationOptions,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinates, GeolocationError>> + Send + 'a>>;
}

/// Ask `provider` for a fix, giving up after `options.timeout` even if the
/// provider itself never answers.
pub async fn locate_with(
    provider: &dyn GeolocationProvider,
    options: &GeolocationOptions,
) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(Ok(position)) if position.is_valid() => Ok(position),
        Ok(Ok(_)) => Err(GeolocationError::Failed("provider returned an invalid position".to_owned())),
        Ok(Err(error)) => Err(error),
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Proof that a lookup was started; hand it back with the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocateTicket {
    pub(crate) revision: u64,
    pub options: GeolocationOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocateOutcome {
    Selected(StationIdentifier),
    /// Fix arrived after a manual selection change and the policy dropped it.
    Discarded,
    /// Directory has no station with usable coordinates.
    NoStation,
    Failed(GeolocationError),
}

impl LocateOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            LocateOutcome::Failed(error) => Some(error.user_message()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Coordinates, GeolocationError>);

    impl GeolocationProvider for Fixed {
        fn current_position<'a>(
            &'a self,
            _options: &'a GeolocationOptions,
        ) -> Pin<Box<dyn Future<Output = Result<Coordinates, GeolocationError>> + Send + 'a>>
        {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    struct Silent;

    impl GeolocationProvider for Silent {
        fn current_position<'a>(
            &'a self,
            _options: &'a GeolocationOptions,
        ) -> Pin<Box<dyn Future<Output = Result<Coordinates, GeolocationError>> + Send + 'a>>
        {
            Box::pin(std::future::pending())
        }
    }

    #[test]
    fn default_options_demand_a_fresh_accurate_fix() {
        let options = LocateConfig::default().options();

        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.maximum_age, Duration::ZERO);
        assert_eq!(options, GeolocationOptions::default());
    }

    #[test]
    fn notices() {
        assert_eq!(GeolocationError::Unavailable.user_message(), UNSUPPORTED_NOTICE);
        assert_eq!(GeolocationError::Denied.user_message(), FAILED_NOTICE);
        assert_eq!(GeolocationError::Timeout.user_message(), FAILED_NOTICE);
        assert_eq!(LocateOutcome::Discarded.notice(), None);
    }

    #[tokio::test]
    async fn provider_result_passes_through() {
        let options = GeolocationOptions::default();
        let here = Coordinates::new(25.0330, 121.5434);

        assert_eq!(locate_with(&Fixed(Ok(here)), &options).await, Ok(here));
        assert_eq!(
            locate_with(&Fixed(Err(GeolocationError::Denied)), &options).await,
            Err(GeolocationError::Denied)
        );
        assert!(matches!(
            locate_with(&Fixed(Ok(Coordinates::missing())), &options).await,
            Err(GeolocationError::Failed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_provider_times_out() {
        let options = GeolocationOptions::default();

        assert_eq!(
            locate_with(&Silent, &options).await,
            Err(GeolocationError::Timeout)
        );
    }
}
