//! Playback Cursor / Frame Reader
//!
//! Advances a cyclic cursor into the active dataset. The cursor is kept
//! in range by modulo arithmetic, so frame reads cannot fail.

use std::sync::Arc;

use crate::logic::dataset::{Dataset, DatasetStore, FaultMode, TelemetryFrame};

// ============================================================================
// EDGE STATE
// ============================================================================

/// Mutable per-process playback state.
///
/// Owned by the edge service behind a single lock; a mode switch replaces
/// the whole state in one assignment so a concurrent tick never observes a
/// half-switched dataset/cursor pair.
#[derive(Debug)]
pub struct EdgeState {
    dataset: Arc<Dataset>,
    cursor: usize,
    mode: FaultMode,
    current: TelemetryFrame,
}

impl EdgeState {
    /// Start in healthy mode at cursor 0
    pub fn new(store: &DatasetStore) -> Self {
        Self::at_mode(store, FaultMode::None)
    }

    fn at_mode(store: &DatasetStore, mode: FaultMode) -> Self {
        let dataset = store.load(mode);
        let current = dataset.frame(0).clone();
        Self {
            dataset,
            cursor: 0,
            mode,
            current,
        }
    }

    /// Advance the cursor one position modulo dataset length and return the
    /// frame at the new position. Infallible by construction.
    pub fn next_frame(&mut self) -> TelemetryFrame {
        self.cursor = (self.cursor + 1) % self.dataset.len();
        self.current = self.dataset.frame(self.cursor).clone();
        self.current.clone()
    }

    /// Swap the active dataset and reset the cursor to 0.
    ///
    /// Single assignment - the replacement state is built fully before the
    /// old one is dropped.
    pub fn set_fault_mode(&mut self, store: &DatasetStore, mode: FaultMode) {
        *self = Self::at_mode(store, mode);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> FaultMode {
        self.mode
    }

    pub fn current_frame(&self) -> &TelemetryFrame {
        &self.current
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::generator::DATASET_LEN;

    #[test]
    fn test_cursor_wraps_back_to_zero_after_full_lap() {
        let store = DatasetStore::new();
        let mut state = EdgeState::new(&store);
        let first = state.current_frame().clone();

        let mut last = None;
        for _ in 0..DATASET_LEN {
            last = Some(state.next_frame());
        }

        assert_eq!(state.cursor(), 0);
        assert_eq!(last.unwrap(), first, "full lap must reproduce frame 0");
    }

    #[test]
    fn test_next_frame_sequence_is_reproducible() {
        let store = DatasetStore::new();
        let mut a = EdgeState::new(&store);
        let mut b = EdgeState::new(&store);
        for _ in 0..25 {
            assert_eq!(a.next_frame(), b.next_frame());
        }
    }

    #[test]
    fn test_mode_switch_resets_cursor() {
        let store = DatasetStore::new();
        let mut state = EdgeState::new(&store);
        for _ in 0..17 {
            state.next_frame();
        }
        assert_eq!(state.cursor(), 17);

        state.set_fault_mode(&store, FaultMode::MechanicalFail);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.mode(), FaultMode::MechanicalFail);
        assert_eq!(
            state.current_frame(),
            store.load(FaultMode::MechanicalFail).frame(0)
        );
    }
}
