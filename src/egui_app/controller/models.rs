use super::*;

impl EguiController {
    /// Re-read the models folder into the picker.
    pub fn refresh_models(&mut self) {
        match self.registry.list() {
            Ok(entries) => self.ui.models.set_items(entries),
            Err(err) => {
                self.ui.models.set_items(Vec::new());
                self.set_status(format!("Failed to list models: {err}"), StatusTone::Error);
            }
        }
    }

    pub fn select_model(&mut self, index: usize) {
        if !self.ui.models.select(index) {
            return;
        }
        if let Some(name) = self.ui.models.selected_name() {
            tracing::debug!("Selected model {name}");
        }
    }

    /// Remove the artifact from disk, then from the picker.
    pub fn delete_model(&mut self, index: usize) {
        let Some(entry) = self.ui.models.items.get(index).cloned() else {
            return;
        };
        if let Err(err) = self.registry.delete(&entry) {
            self.set_status(
                format!("Failed to delete {}: {err}", entry.name),
                StatusTone::Error,
            );
            return;
        }
        self.ui.models.remove(index);
        if self
            .loaded_model
            .as_ref()
            .is_some_and(|(path, _)| *path == entry.path)
        {
            self.loaded_model = None;
        }
        self.set_status(format!("Deleted {}", entry.name), StatusTone::Info);
    }
}
