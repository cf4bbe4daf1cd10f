use super::*;
use crate::inference;
use crate::model_store::ModelEntry;
use rfd::FileDialog;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

impl EguiController {
    /// Ask for an image and classify it with the selected model.
    pub fn predict_via_dialog(&mut self) {
        if self.ui.models.selected_entry().is_none() {
            self.set_status("Train or select a model first", StatusTone::Warning);
            return;
        }
        let Some(path) = FileDialog::new()
            .set_title("Choose a file")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.predict_from_path(&path);
    }

    pub fn predict_from_path(&mut self, path: &Path) {
        let Some(entry) = self.ui.models.selected_entry().cloned() else {
            self.set_status("Train or select a model first", StatusTone::Warning);
            return;
        };
        if let Err(err) = self.ensure_model_loaded(&entry) {
            self.set_status(err, StatusTone::Error);
            return;
        }
        let Some((_, model)) = self.loaded_model.as_ref() else {
            return;
        };
        let result = inference::prepare_image(path).and_then(|prepared| {
            inference::predict_label(model, &prepared).map(|prediction| (prepared, prediction))
        });
        match result {
            Ok((prepared, prediction)) => {
                let message = prediction.message();
                self.ui
                    .prediction
                    .set(message.clone(), prepared.preview, path.to_path_buf());
                self.set_status(
                    format!(
                        "{message} ({:.1}% with {})",
                        prediction.confidence * 100.0,
                        entry.name
                    ),
                    StatusTone::Info,
                );
            }
            Err(err) => self.set_status(format!("Prediction failed: {err}"), StatusTone::Error),
        }
    }

    fn ensure_model_loaded(&mut self, entry: &ModelEntry) -> Result<(), String> {
        if self
            .loaded_model
            .as_ref()
            .is_some_and(|(path, _)| *path == entry.path)
        {
            return Ok(());
        }
        let model = self
            .registry
            .load(entry)
            .map_err(|err| format!("Failed to load {}: {err}", entry.name))?;
        tracing::info!("Loaded model {}", entry.name);
        self.loaded_model = Some((entry.path.clone(), model));
        Ok(())
    }
}
