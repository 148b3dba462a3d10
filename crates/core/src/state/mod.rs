//! Application state and the actions that mutate it.

use walkshed_transit::{StationDirectory, StationIdentifier};

use crate::analysis::AnalysisPanel;

pub mod selection;
pub mod thresholds;

pub use selection::SelectionSet;
pub use thresholds::{MINUTES_RANGE, THRESHOLD_COUNT, TimeThresholds};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StateError {
    #[error("Station not found: {0}")]
    UnknownStation(StationIdentifier),

    #[error("Threshold index {0} out of range")]
    ThresholdIndex(usize),

    #[error("Threshold {index} must be between 1 and 30 minutes, got {minutes}")]
    ThresholdOutOfRange { index: usize, minutes: u32 },
}

/// Everything the user can change, owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    selection: SelectionSet,
    thresholds: TimeThresholds,
    locating: bool,
    /// Bumped on every selection change; used to spot stale location fixes.
    selection_revision: u64,
    pub(crate) analysis: AnalysisPanel,
}

impl AppState {
    /// Selection seeded with the first station of the directory, if any.
    pub fn seeded(directory: &dyn StationDirectory) -> Self {
        let selection = directory
            .all_stations()
            .first()
            .map(|station| SelectionSet::seeded(station.id().clone()))
            .unwrap_or_default();

        Self {
            selection,
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn thresholds(&self) -> &TimeThresholds {
        &self.thresholds
    }

    pub fn is_locating(&self) -> bool {
        self.locating
    }

    pub fn selection_revision(&self) -> u64 {
        self.selection_revision
    }

    pub fn analysis(&self) -> &AnalysisPanel {
        &self.analysis
    }

    pub fn toggle(
        &mut self,
        directory: &dyn StationDirectory,
        id: &StationIdentifier,
    ) -> Result<bool, StateError> {
        if directory.get_station(id).is_none() {
            return Err(StateError::UnknownStation(id.clone()));
        }

        let selected = self.selection.toggle(id.clone());
        self.bump();
        Ok(selected)
    }

    pub fn select_all(&mut self, directory: &dyn StationDirectory) {
        self.selection
            .replace_all(directory.all_stations().iter().map(|s| s.id().clone()));
        self.bump();
    }

    pub fn clear_all(&mut self) {
        self.selection.clear();
        self.bump();
    }

    /// Selection becomes exactly `id`.
    pub fn replace_selection(
        &mut self,
        directory: &dyn StationDirectory,
        id: &StationIdentifier,
    ) -> Result<(), StateError> {
        if directory.get_station(id).is_none() {
            return Err(StateError::UnknownStation(id.clone()));
        }

        self.selection.replace_all([id.clone()]);
        self.bump();
        Ok(())
    }

    pub fn is_all_selected(&self, directory: &dyn StationDirectory) -> bool {
        !directory.is_empty() && self.selection.len() == directory.len()
    }

    pub fn set_threshold(&mut self, index: usize, minutes: u32) -> Result<(), StateError> {
        self.thresholds.set(index, minutes)
    }

    pub(crate) fn set_locating(&mut self, locating: bool) {
        self.locating = locating;
    }

    fn bump(&mut self) {
        self.selection_revision = self.selection_revision.wrapping_add(1);
    }
}
