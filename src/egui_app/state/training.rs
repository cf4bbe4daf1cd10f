use crate::session::EpochRecord;

/// UI state for the training workflow, mirrored from the session after every change.
#[derive(Clone, Debug)]
pub struct TrainingUiState {
    pub button_label: &'static str,
    pub button_enabled: bool,
    /// Raw contents of the epoch text field.
    pub epochs_text: String,
    /// Epoch target the chart is scaled to.
    pub epochs: usize,
    pub history: Vec<EpochRecord>,
    /// Pre-formatted history lines for the list view.
    pub history_rows: Vec<String>,
    /// Layer table of the model being trained.
    pub summary: String,
    pub last_saved: Option<String>,
}

impl Default for TrainingUiState {
    fn default() -> Self {
        Self {
            button_label: "Train",
            button_enabled: true,
            epochs_text: "20".into(),
            epochs: 20,
            history: Vec::new(),
            history_rows: Vec::new(),
            summary: "No model configured yet".into(),
            last_saved: None,
        }
    }
}
