//! Maintains app state and bridges training, storage and inference to the egui UI.

mod background_jobs;
mod jobs;
mod model_training;
mod models;
mod predictions;
#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, AppSettings};
use crate::dataset::{DEFAULT_BASE_URL, FashionMnist};
use crate::egui_app::state::UiState;
use crate::egui_app::ui::style::{self, StatusTone};
use crate::egui_app::view_model;
use crate::ml::mlp::SequentialModel;
use crate::model_store::ModelRegistry;
use crate::session::{TrainStatus, TrainingSession};

use jobs::ControllerJobs;

/// Owns the UI state, the training session and the background job channel.
pub struct EguiController {
    pub ui: UiState,
    session: TrainingSession,
    settings: AppSettings,
    /// Where settings are persisted; `None` keeps them in memory only.
    config_path: Option<PathBuf>,
    registry: ModelRegistry,
    dataset_dir: PathBuf,
    dataset_base_url: String,
    /// Decoded dataset kept from the first run so later runs skip loading.
    dataset: Option<Arc<FashionMnist>>,
    /// Most recently loaded model, keyed by its artifact path.
    loaded_model: Option<(PathBuf, SequentialModel)>,
    jobs: ControllerJobs,
}

impl EguiController {
    pub fn new(
        settings: AppSettings,
        config_path: Option<PathBuf>,
        registry: ModelRegistry,
        dataset_dir: PathBuf,
    ) -> Self {
        let epochs = settings.training.epochs;
        let mut controller = Self {
            ui: UiState::default(),
            session: TrainingSession::new(epochs),
            settings,
            config_path,
            registry,
            dataset_dir,
            dataset_base_url: DEFAULT_BASE_URL.to_string(),
            dataset: None,
            loaded_model: None,
            jobs: ControllerJobs::new(),
        };
        controller.ui.training.epochs_text = controller.session.epochs().to_string();
        controller.sync_training_ui();
        controller
    }

    /// Load persisted config, resolve directories and populate the model list.
    pub fn from_config() -> Result<Self, String> {
        let config_path =
            config::config_path().map_err(|err| format!("Failed to resolve config: {err}"))?;
        let settings = config::load_from_path(&config_path)
            .map_err(|err| format!("Failed to load config: {err}"))?;
        let models_dir = settings
            .resolved_models_dir()
            .map_err(|err| format!("Failed to prepare models folder: {err}"))?;
        let dataset_dir = settings
            .resolved_dataset_dir()
            .map_err(|err| format!("Failed to prepare dataset folder: {err}"))?;
        let registry = ModelRegistry::new(models_dir).map_err(|err| err.to_string())?;
        tracing::info!(
            "Models in {}, dataset cache in {}",
            registry.dir().display(),
            dataset_dir.display()
        );
        let mut controller = Self::new(settings, Some(config_path), registry, dataset_dir);
        controller.refresh_models();
        Ok(controller)
    }

    pub fn session(&self) -> &TrainingSession {
        &self.session
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Point dataset downloads at another mirror.
    pub fn set_dataset_base_url(&mut self, url: impl Into<String>) {
        self.dataset_base_url = url.into();
    }

    pub fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        let text = text.into();
        if matches!(tone, StatusTone::Error) {
            tracing::warn!("{text}");
        }
        self.ui.status.push_log(text.clone());
        self.ui.status.text = text;
        self.ui.status.badge_label = style::status_badge_label(tone).into();
        self.ui.status.badge_color = style::status_badge_color(tone);
    }

    fn persist_settings(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = config::save_to_path(&self.settings, path) {
            tracing::warn!("Failed to save settings: {err}");
        }
    }

    /// Mirror the session into the UI state read by the renderer.
    fn sync_training_ui(&mut self) {
        let training = &mut self.ui.training;
        training.button_label = self.session.button_label();
        training.button_enabled = self.session.button_enabled();
        training.epochs = self.session.epochs();
        let history = self.session.history();
        if training.history != history {
            training.history = history.to_vec();
            training.history_rows = history.iter().map(view_model::history_row).collect();
        }
    }
}
