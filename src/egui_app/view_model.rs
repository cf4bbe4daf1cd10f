//! Helpers to convert domain data into egui-facing strings.

use crate::model_store::ModelEntry;
use crate::session::EpochRecord;

/// One line of the epoch history list.
pub fn history_row(record: &EpochRecord) -> String {
    format!(
        "{}: {:.4}  {:.2}s",
        record.epoch, record.loss, record.elapsed_secs
    )
}

/// Dropdown text for a saved model, with the accuracy spelled out when the
/// name follows the artifact naming rule.
pub fn model_label(entry: &ModelEntry) -> String {
    match entry.parsed_name() {
        Some(parsed) => format!("{}  ({:.1}%)", entry.name, parsed.accuracy * 100.0),
        None => entry.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn history_row_shows_epoch_loss_and_time() {
        let record = EpochRecord {
            epoch: 3,
            loss: 0.51234,
            elapsed_secs: 1.5,
        };
        assert_eq!(history_row(&record), "3: 0.5123  1.50s");
    }

    #[test]
    fn model_label_includes_accuracy_for_artifacts() {
        let entry = ModelEntry {
            name: "Sequential_2_0.884".into(),
            path: PathBuf::from("Sequential_2_0.884"),
        };
        assert_eq!(model_label(&entry), "Sequential_2_0.884  (88.4%)");
        let other = ModelEntry {
            name: "notes".into(),
            path: PathBuf::from("notes"),
        };
        assert_eq!(model_label(&other), "notes");
    }
}
