//! Shared state types for the egui UI.

mod models;
mod prediction;
mod progress;
mod status;
mod training;

pub use models::*;
pub use prediction::*;
pub use progress::*;
pub use status::*;
pub use training::*;

/// Top-level UI model consumed by the egui renderer.
#[derive(Clone, Debug)]
pub struct UiState {
    pub status: StatusBarState,
    pub training: TrainingUiState,
    pub models: ModelPickerState,
    pub prediction: PredictionState,
    /// Progress of the active training run.
    pub progress: ProgressOverlayState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: StatusBarState::idle(),
            training: TrainingUiState::default(),
            models: ModelPickerState::default(),
            prediction: PredictionState::default(),
            progress: ProgressOverlayState::default(),
        }
    }
}
