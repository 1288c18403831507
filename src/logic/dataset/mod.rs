//! Telemetry Dataset Store
//!
//! Fixed, deterministic frame arrays per fault scenario. Generated once at
//! construction, read-only thereafter. Playback wraps modulo length.

pub mod frame;
pub mod generator;


use std::collections::HashMap;
use std::sync::Arc;

pub use frame::{FaultMode, NetworkLogEntry, TelemetryFrame};

// ============================================================================
// DATASET
// ============================================================================

/// Named, ordered, finite sequence of frames for one scenario
#[derive(Debug)]
pub struct Dataset {
    pub mode: FaultMode,
    frames: Vec<TelemetryFrame>,
}

impl Dataset {
    fn new(mode: FaultMode) -> Self {
        let frames = generator::generate(mode);
        debug_assert!(!frames.is_empty());
        Self { mode, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at an index, reduced modulo length
    pub fn frame(&self, index: usize) -> &TelemetryFrame {
        &self.frames[index % self.frames.len()]
    }
}

// ============================================================================
// STORE
// ============================================================================

/// All four scenario datasets, generated once and shared read-only
#[derive(Debug, Clone)]
pub struct DatasetStore {
    datasets: HashMap<FaultMode, Arc<Dataset>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        let datasets = FaultMode::all()
            .into_iter()
            .map(|mode| (mode, Arc::new(Dataset::new(mode))))
            .collect();
        Self { datasets }
    }

    /// Dataset for a scenario. Every mode is pre-generated, so this cannot miss.
    pub fn load(&self, mode: FaultMode) -> Arc<Dataset> {
        Arc::clone(&self.datasets[&mode])
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}
