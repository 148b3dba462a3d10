use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::state::StateError;

pub const THRESHOLD_COUNT: usize = 3;
pub const MINUTES_RANGE: RangeInclusive<u32> = 1..=30;

/// Three walking times in minutes, each in `1..=30`, in slider order.
///
/// Values are not kept sorted; the geometry sorts them for layering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; THRESHOLD_COUNT]", into = "[u32; THRESHOLD_COUNT]")]
pub struct TimeThresholds([u32; THRESHOLD_COUNT]);

impl TimeThresholds {
    pub fn new(values: [u32; THRESHOLD_COUNT]) -> Result<Self, StateError> {
        for (index, minutes) in values.into_iter().enumerate() {
            check(index, minutes)?;
        }
        Ok(Self(values))
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    pub fn set(&mut self, index: usize, minutes: u32) -> Result<(), StateError> {
        if index >= THRESHOLD_COUNT {
            return Err(StateError::ThresholdIndex(index));
        }
        check(index, minutes)?;
        self.0[index] = minutes;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or_default()
    }
}

fn check(index: usize, minutes: u32) -> Result<(), StateError> {
    if MINUTES_RANGE.contains(&minutes) {
        Ok(())
    } else {
        Err(StateError::ThresholdOutOfRange { index, minutes })
    }
}

impl Default for TimeThresholds {
    fn default() -> Self {
        Self([2, 5, 8])
    }
}

impl TryFrom<[u32; THRESHOLD_COUNT]> for TimeThresholds {
    type Error = StateError;

    fn try_from(values: [u32; THRESHOLD_COUNT]) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<TimeThresholds> for [u32; THRESHOLD_COUNT] {
    fn from(thresholds: TimeThresholds) -> Self {
        thresholds.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_max() {
        let thresholds = TimeThresholds::default();
        assert_eq!(thresholds.as_slice(), [2, 5, 8]);
        assert_eq!(thresholds.max(), 8);
    }

    #[test]
    fn set_validates_index_and_range() {
        let mut thresholds = TimeThresholds::default();

        thresholds.set(0, 30).unwrap();
        thresholds.set(2, 1).unwrap();
        assert_eq!(thresholds.as_slice(), [30, 5, 1]);

        assert!(matches!(thresholds.set(3, 5), Err(StateError::ThresholdIndex(3))));
        assert!(matches!(
            thresholds.set(1, 0),
            Err(StateError::ThresholdOutOfRange { index: 1, minutes: 0 })
        ));
        assert!(thresholds.set(1, 31).is_err());
        assert_eq!(thresholds.as_slice(), [30, 5, 1]);
    }

    #[test]
    fn deserialization_is_validated() {
        let parsed: TimeThresholds = serde_json::from_str("[10, 3, 3]").unwrap();
        assert_eq!(parsed.as_slice(), [10, 3, 3]);

        assert!(serde_json::from_str::<TimeThresholds>("[10, 3, 45]").is_err());
        assert!(serde_json::from_str::<TimeThresholds>("[10, 3]").is_err());
    }
}
