use crate::model_store::ModelEntry;

/// Saved models offered in the dropdown, plus the current selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelPickerState {
    pub items: Vec<ModelEntry>,
    pub selected: Option<usize>,
}

impl ModelPickerState {
    /// Replace the item list, keeping the selection on the same name when it survives.
    ///
    /// Falls back to the first item, or `None` for an empty list.
    pub fn set_items(&mut self, items: Vec<ModelEntry>) {
        let previous = self.selected_name().map(str::to_owned);
        self.items = items;
        self.selected = previous
            .and_then(|name| self.items.iter().position(|item| item.name == name))
            .or(if self.items.is_empty() { None } else { Some(0) });
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn select_name(&mut self, name: &str) -> bool {
        match self.items.iter().position(|item| item.name == name) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn selected_entry(&self) -> Option<&ModelEntry> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_entry().map(|entry| entry.name.as_str())
    }

    /// Drop the item at `index`.
    ///
    /// Removing the selected item moves the selection to the last remaining
    /// item (or clears it). Removing another item keeps the same entry selected.
    pub fn remove(&mut self, index: usize) -> Option<ModelEntry> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.selected = match self.selected {
            Some(selected) if selected == index => self.items.len().checked_sub(1),
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        Some(removed)
    }
}
