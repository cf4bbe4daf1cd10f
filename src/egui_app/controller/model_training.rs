use super::jobs::JobMessage;
use super::*;
use crate::egui_app::state::ProgressOverlayState;
use crate::session::EpochRecord;
use crate::trainer::{self, TrainEvent, TrainOutcome, TrainRequest};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;

#[derive(Clone, Debug)]
pub(super) struct TrainingJob {
    pub(super) run_id: u64,
    pub(super) request: TrainRequest,
    pub(super) dataset: Option<Arc<FashionMnist>>,
    pub(super) registry: ModelRegistry,
    pub(super) cancel: Arc<AtomicBool>,
}

#[derive(Debug)]
pub(crate) enum TrainingMessage {
    Status { run_id: u64, text: String },
    DatasetReady { run_id: u64, dataset: Arc<FashionMnist> },
    Configured { run_id: u64, summary: String },
    Epoch { run_id: u64, record: EpochRecord },
    Saving { run_id: u64 },
    Finished {
        run_id: u64,
        result: Result<TrainOutcome, String>,
    },
}

impl TrainingMessage {
    fn run_id(&self) -> u64 {
        match self {
            TrainingMessage::Status { run_id, .. }
            | TrainingMessage::DatasetReady { run_id, .. }
            | TrainingMessage::Configured { run_id, .. }
            | TrainingMessage::Epoch { run_id, .. }
            | TrainingMessage::Saving { run_id }
            | TrainingMessage::Finished { run_id, .. } => *run_id,
        }
    }
}

pub(super) fn run_training(
    job: TrainingJob,
    tx: &Sender<JobMessage>,
) -> Result<TrainOutcome, String> {
    let run_id = job.run_id;
    let send = |message: TrainingMessage| {
        let _ = tx.send(JobMessage::Training(message));
    };
    trainer::run(
        &job.request,
        job.dataset,
        &job.registry,
        &job.cancel,
        &mut |event| match event {
            TrainEvent::Status(text) => send(TrainingMessage::Status { run_id, text }),
            TrainEvent::DatasetReady(dataset) => {
                send(TrainingMessage::DatasetReady { run_id, dataset })
            }
            TrainEvent::Configured { summary } => {
                send(TrainingMessage::Configured { run_id, summary })
            }
            TrainEvent::Epoch(record) => send(TrainingMessage::Epoch { run_id, record }),
            TrainEvent::Saving => send(TrainingMessage::Saving { run_id }),
        },
    )
    .map_err(|err| err.to_string())
}

impl EguiController {
    /// The single train/stop button.
    pub fn toggle_training(&mut self) {
        match self.session.status() {
            TrainStatus::Train if !self.session.is_active() => self.start_training(),
            TrainStatus::Stop => self.stop_training(),
            _ => {}
        }
    }

    pub fn start_training(&mut self) {
        if self.jobs.training_in_progress() {
            self.set_status("Training already running", StatusTone::Warning);
            return;
        }
        let ticket = match self.session.begin_run() {
            Ok(ticket) => ticket,
            Err(err) => {
                self.set_status(err.to_string(), StatusTone::Warning);
                return;
            }
        };
        if self.settings.training.epochs != ticket.epochs {
            self.settings.training.epochs = ticket.epochs;
            self.persist_settings();
        }
        let mut request = TrainRequest::from_settings(
            &self.settings.training,
            ticket.epochs,
            self.dataset_dir.clone(),
        );
        request.base_url = self.dataset_base_url.clone();
        self.ui.training.summary = "Configuring model…".into();
        self.ui.progress = ProgressOverlayState::new("Training", ticket.epochs);
        self.sync_training_ui();
        self.set_status(
            format!("Starting a {}-epoch run", ticket.epochs),
            StatusTone::Busy,
        );
        self.jobs.begin_training(TrainingJob {
            run_id: ticket.run_id,
            request,
            dataset: self.dataset.clone(),
            registry: self.registry.clone(),
            cancel: ticket.cancel,
        });
    }

    pub fn stop_training(&mut self) {
        if self.session.request_stop() {
            self.ui.progress.detail = Some("Stopping after the current batch…".into());
            self.set_status("Stopping training…", StatusTone::Busy);
        }
        self.sync_training_ui();
    }

    /// Store the raw field text; only valid positive integers change the target.
    pub fn set_epochs_text(&mut self, text: &str) {
        self.ui.training.epochs_text = text.to_string();
        if self.session.set_epochs_from_text(text) {
            self.sync_training_ui();
        }
    }

    pub(super) fn apply_training_message(&mut self, message: TrainingMessage) {
        if self.session.current_run_id() != Some(message.run_id()) {
            tracing::debug!("Dropping message from stale run {}", message.run_id());
            return;
        }
        match message {
            TrainingMessage::Status { text, .. } => {
                self.ui.progress.detail = Some(text.clone());
                self.set_status(text, StatusTone::Busy);
            }
            TrainingMessage::DatasetReady { dataset, .. } => {
                self.dataset = Some(dataset);
            }
            TrainingMessage::Configured { run_id, summary } => {
                self.session.mark_configured(run_id);
                self.ui.training.summary = summary;
                self.ui.progress.detail = Some("Training…".into());
                self.set_status("Training…", StatusTone::Busy);
            }
            TrainingMessage::Epoch { run_id, record } => {
                if self.session.record_epoch(run_id, record) {
                    self.ui.progress.completed = self.session.history().len();
                    self.ui.progress.detail =
                        Some(format!("Epoch {} of {}", record.epoch, self.session.epochs()));
                }
            }
            TrainingMessage::Saving { run_id } => {
                if self.session.mark_saving(run_id) {
                    self.ui.progress.detail = Some("Evaluating and saving…".into());
                    self.set_status("Saving model…", StatusTone::Busy);
                }
            }
            TrainingMessage::Finished { run_id, result } => {
                self.session.finish(run_id);
                self.jobs.clear_training();
                self.ui.progress.reset();
                match result {
                    Ok(TrainOutcome::Saved { entry, evaluation }) => {
                        self.ui.training.last_saved = Some(entry.name.clone());
                        self.refresh_models();
                        self.ui.models.select_name(&entry.name);
                        self.set_status(
                            format!(
                                "Saved {} (test accuracy {:.2}%)",
                                entry.name,
                                evaluation.accuracy * 100.0
                            ),
                            StatusTone::Info,
                        );
                    }
                    Ok(TrainOutcome::Cancelled { epochs_completed }) => {
                        self.set_status(
                            format!("Training stopped after {epochs_completed} epoch(s)"),
                            StatusTone::Warning,
                        );
                    }
                    Err(err) => {
                        self.set_status(format!("Training failed: {err}"), StatusTone::Error);
                    }
                }
            }
        }
        self.sync_training_ui();
    }
}
