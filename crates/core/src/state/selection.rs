use walkshed_transit::StationIdentifier;

/// Selected stations, unique by id, in the order they were picked.
///
/// Order only affects how the selection is listed; geometry ignores it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<StationIdentifier>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(id: StationIdentifier) -> Self {
        Self { ids: vec![id] }
    }

    pub fn contains(&self, id: &StationIdentifier) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[StationIdentifier] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationIdentifier> {
        self.ids.iter()
    }

    /// Adds `id` if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, id: StationIdentifier) -> bool {
        if let Some(position) = self.ids.iter().position(|existing| *existing == id) {
            self.ids.remove(position);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace the whole selection, dropping repeated ids.
    pub fn replace_all(&mut self, ids: impl IntoIterator<Item = StationIdentifier>) {
        self.ids.clear();
        for id in ids {
            if !self.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Same members regardless of order.
    pub fn same_members(&self, other: &SelectionSet) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StationIdentifier {
        StationIdentifier::new(s)
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let mut selection = SelectionSet::new();
        selection.toggle(id("R10"));
        selection.toggle(id("BL11"));
        let before = selection.clone();

        assert!(selection.toggle(id("G09")));
        assert!(!selection.toggle(id("G09")));
        assert_eq!(selection, before);

        assert!(!selection.toggle(id("R10")));
        assert!(selection.toggle(id("R10")));
        assert!(selection.same_members(&before));
        assert_eq!(selection.ids(), [id("BL11"), id("R10")]);
    }

    #[test]
    fn replace_all_deduplicates() {
        let mut selection = SelectionSet::seeded(id("R10"));
        selection.replace_all([id("A"), id("B"), id("A")]);

        assert_eq!(selection.ids(), [id("A"), id("B")]);
        assert!(!selection.contains(&id("R10")));
    }
}
