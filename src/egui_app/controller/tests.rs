use super::jobs::JobMessage;
use super::model_training::TrainingMessage;
use super::*;
use crate::dataset::FashionMnistFile;
use crate::dataset::idx::tests::{encode_images, encode_labels, gzip};
use crate::session::EpochRecord;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const SIDE: u32 = 28;

fn write_split(dir: &Path, images: FashionMnistFile, labels: FashionMnistFile, count: usize) {
    let pixels: Vec<u8> = (0..count * (SIDE * SIDE) as usize)
        .map(|i| ((i / 7) % 251) as u8)
        .collect();
    let label_values: Vec<u8> = (0..count).map(|i| (i % 10) as u8).collect();
    std::fs::write(
        dir.join(images.file_name()),
        gzip(&encode_images(SIDE, SIDE, &pixels)),
    )
    .unwrap();
    std::fs::write(dir.join(labels.file_name()), gzip(&encode_labels(&label_values))).unwrap();
}

struct Fixture {
    _root: TempDir,
    controller: EguiController,
}

fn controller_with_dataset() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let dataset_dir = root.path().join("dataset");
    std::fs::create_dir_all(&dataset_dir).unwrap();
    write_split(
        &dataset_dir,
        FashionMnistFile::TrainImages,
        FashionMnistFile::TrainLabels,
        20,
    );
    write_split(
        &dataset_dir,
        FashionMnistFile::TestImages,
        FashionMnistFile::TestLabels,
        10,
    );
    let registry = ModelRegistry::new(root.path().join("models")).unwrap();
    let mut controller = EguiController::new(AppSettings::default(), None, registry, dataset_dir);
    // Any download attempt fails fast instead of reaching the network.
    controller.set_dataset_base_url("http://127.0.0.1:9");
    Fixture {
        _root: root,
        controller,
    }
}

fn poll_until(controller: &mut EguiController, done: impl Fn(&EguiController) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(120);
    while !done(controller) {
        assert!(Instant::now() < deadline, "timed out waiting for training");
        controller.poll_background_jobs();
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn full_run_records_history_and_saves_a_selectable_model() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("2");
    controller.toggle_training();
    assert!(controller.session().is_active());
    assert!(!controller.ui.training.button_enabled);
    assert!(controller.ui.progress.visible);

    poll_until(controller, |c| !c.session().is_active());

    assert_eq!(controller.ui.training.history.len(), 2);
    assert_eq!(controller.ui.training.history_rows.len(), 2);
    assert!(controller.ui.training.history_rows[0].starts_with("1: "));
    assert!(controller.ui.training.summary.contains("Total params"));
    assert_eq!(controller.ui.training.button_label, "Train");
    assert!(controller.ui.training.button_enabled);
    assert!(!controller.ui.progress.visible);
    assert_eq!(controller.ui.models.items.len(), 1);
    let saved = controller.ui.training.last_saved.clone().unwrap();
    assert_eq!(controller.ui.models.selected_name(), Some(saved.as_str()));
    assert!(saved.starts_with("Sequential_0_"));
    assert_eq!(controller.ui.status.badge_label, "Info");
}

#[test]
fn second_run_reuses_the_decoded_dataset() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("1");
    controller.toggle_training();
    poll_until(controller, |c| !c.session().is_active());
    assert!(controller.dataset.is_some());

    for file in FashionMnistFile::ALL {
        std::fs::remove_file(controller.dataset_dir.join(file.file_name())).unwrap();
    }
    controller.toggle_training();
    poll_until(controller, |c| !c.session().is_active());
    assert_eq!(controller.ui.models.items.len(), 2);
    assert_eq!(controller.ui.training.history.len(), 1);
}

#[test]
fn stop_cancels_without_saving() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("10000");
    controller.toggle_training();
    poll_until(controller, |c| c.ui.training.button_label == "Stop");
    assert!(controller.ui.training.button_enabled);

    controller.toggle_training();
    assert_eq!(controller.ui.training.button_label, "Train");
    assert!(!controller.ui.training.button_enabled);
    assert!(controller.session().cancel_requested());

    poll_until(controller, |c| !c.session().is_active());
    assert!(controller.ui.training.button_enabled);
    assert!(controller.ui.models.items.is_empty());
    assert_eq!(controller.ui.status.badge_label, "Warning");
}

#[test]
fn late_saving_message_keeps_the_stop_state() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("10000");
    controller.toggle_training();
    poll_until(controller, |c| c.ui.training.button_label == "Stop");
    controller.toggle_training();

    let run_id = controller.session().current_run_id().unwrap();
    controller
        .jobs
        .message_sender()
        .send(JobMessage::Training(TrainingMessage::Saving { run_id }))
        .unwrap();
    controller.poll_background_jobs();
    if controller.session().is_active() {
        assert_eq!(controller.session().status(), TrainStatus::Train);
        assert!(!controller.ui.training.button_enabled);
        assert_ne!(controller.ui.status.text, "Saving model…");
    }

    poll_until(controller, |c| !c.session().is_active());
    assert!(controller.ui.models.items.is_empty());
}

#[test]
fn button_is_ignored_while_configuring() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("1");
    controller.toggle_training();
    let run_id = controller.session().current_run_id();
    controller.toggle_training();
    controller.start_training();
    assert_eq!(controller.session().current_run_id(), run_id);
    poll_until(controller, |c| !c.session().is_active());
    assert_eq!(controller.ui.models.items.len(), 1);
}

#[test]
fn missing_dataset_reports_failure_and_reenables_button() {
    let root = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::new(root.path().join("models")).unwrap();
    let mut controller = EguiController::new(
        AppSettings::default(),
        None,
        registry,
        root.path().join("empty"),
    );
    controller.set_dataset_base_url("http://127.0.0.1:9");
    controller.toggle_training();
    poll_until(&mut controller, |c| !c.session().is_active());
    assert_eq!(controller.ui.status.badge_label, "Error");
    assert!(controller.ui.status.text.starts_with("Training failed"));
    assert!(controller.ui.training.button_enabled);
}

#[test]
fn messages_from_stale_runs_are_dropped() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    let tx = controller.jobs.message_sender();
    tx.send(JobMessage::Training(TrainingMessage::Epoch {
        run_id: 99,
        record: EpochRecord {
            epoch: 1,
            loss: 0.5,
            elapsed_secs: 0.1,
        },
    }))
    .unwrap();
    tx.send(JobMessage::Training(TrainingMessage::Finished {
        run_id: 99,
        result: Err("boom".into()),
    }))
    .unwrap();
    controller.poll_background_jobs();
    assert!(controller.ui.training.history.is_empty());
    assert_eq!(controller.ui.status.badge_label, "Idle");
}

#[test]
fn invalid_epoch_text_keeps_previous_target() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("7");
    assert_eq!(controller.session().epochs(), 7);
    controller.set_epochs_text("seven");
    assert_eq!(controller.ui.training.epochs_text, "seven");
    assert_eq!(controller.session().epochs(), 7);
    assert_eq!(controller.ui.training.epochs, 7);
    controller.set_epochs_text("0");
    assert_eq!(controller.session().epochs(), 7);
}

#[test]
fn deleting_models_updates_selection() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    let model = crate::ml::mlp::SequentialModel::default_architecture(1);
    for accuracy in [0.5, 0.6, 0.7] {
        controller.registry().save(&model, accuracy).unwrap();
    }
    controller.refresh_models();
    assert_eq!(controller.ui.models.items.len(), 3);

    controller.select_model(0);
    let doomed = controller.ui.models.items[0].clone();
    controller.delete_model(0);
    assert!(!doomed.path.exists());
    assert_eq!(controller.ui.models.items.len(), 2);
    assert_eq!(controller.ui.models.selected, Some(1));

    controller.delete_model(1);
    controller.delete_model(0);
    assert!(controller.ui.models.items.is_empty());
    assert_eq!(controller.ui.models.selected, None);
    controller.delete_model(0);
    assert!(controller.registry().list().unwrap().is_empty());
}

#[test]
fn predict_without_model_warns() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.predict_from_path(Path::new("missing.png"));
    assert_eq!(controller.ui.status.text, "Train or select a model first");
    assert!(controller.ui.prediction.label.is_none());
}

#[test]
fn prediction_uses_the_selected_model() {
    let mut fixture = controller_with_dataset();
    let controller = &mut fixture.controller;
    controller.set_epochs_text("1");
    controller.toggle_training();
    poll_until(controller, |c| !c.session().is_active());

    let image_path = controller.dataset_dir.join("sample.png");
    image::GrayImage::from_pixel(40, 40, image::Luma([200]))
        .save(&image_path)
        .unwrap();
    controller.predict_from_path(&image_path);

    let label = controller.ui.prediction.label.clone().unwrap();
    assert!(label.starts_with("It's a "));
    assert_eq!(controller.ui.prediction.preview.as_ref().map(Vec::len), Some(784));
    assert_eq!(controller.ui.prediction.revision, 1);
    assert!(controller.loaded_model.is_some());
}
