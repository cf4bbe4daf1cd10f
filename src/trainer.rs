//! Load data, fit the default network, evaluate it and save the artifact.
//!
//! Shared by the desktop job runner and the headless `fashion-train` binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thiserror::Error;

use crate::config::TrainingSettings;
use crate::dataset::{DEFAULT_BASE_URL, DatasetError, FashionMnist};
use crate::ml::mlp::{self, Evaluation, FitOptions, FitOutcome, SequentialModel, TrainError};
use crate::model_store::{ModelEntry, ModelRegistry, ModelStoreError};
use crate::session::EpochRecord;

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Store(#[from] ModelStoreError),
}

#[derive(Debug, Clone)]
pub struct TrainRequest {
    pub options: FitOptions,
    pub dataset_dir: PathBuf,
    pub base_url: String,
}

impl TrainRequest {
    pub fn from_settings(settings: &TrainingSettings, epochs: usize, dataset_dir: PathBuf) -> Self {
        Self {
            options: FitOptions {
                epochs,
                batch_size: settings.batch_size,
                learning_rate: settings.learning_rate,
                seed: settings.seed,
                ..FitOptions::default()
            },
            dataset_dir,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Progress emitted while a run advances.
#[derive(Debug, Clone)]
pub enum TrainEvent {
    Status(String),
    DatasetReady(Arc<FashionMnist>),
    Configured { summary: String },
    Epoch(EpochRecord),
    Saving,
}

#[derive(Debug, Clone)]
pub enum TrainOutcome {
    Saved {
        entry: ModelEntry,
        evaluation: Evaluation,
    },
    Cancelled {
        epochs_completed: usize,
    },
}

/// Run one full train/evaluate/save cycle.
///
/// `dataset` skips loading when a previous run already decoded it. The
/// cancel token is checked again after the fit and after evaluation, so a
/// stop raised at any point before the write leaves nothing on disk.
pub fn run(
    request: &TrainRequest,
    dataset: Option<Arc<FashionMnist>>,
    registry: &ModelRegistry,
    cancel: &AtomicBool,
    on_event: &mut dyn FnMut(TrainEvent),
) -> Result<TrainOutcome, TrainerError> {
    let dataset = match dataset {
        Some(dataset) => dataset,
        None => {
            on_event(TrainEvent::Status("Loading Fashion-MNIST…".into()));
            let loaded = FashionMnist::load_or_download_from(
                &request.dataset_dir,
                &request.base_url,
                &mut |text| on_event(TrainEvent::Status(text)),
            )?;
            let loaded = Arc::new(loaded);
            on_event(TrainEvent::DatasetReady(Arc::clone(&loaded)));
            loaded
        }
    };

    let mut model = SequentialModel::default_architecture(request.options.seed);
    on_event(TrainEvent::Configured {
        summary: model.summary(),
    });
    tracing::info!(
        "Training {} for {} epochs on {} samples",
        model.kind(),
        request.options.epochs,
        dataset.train.len()
    );

    let mut last_tick = Instant::now();
    let outcome = mlp::fit(
        &mut model,
        &dataset.train,
        &request.options,
        cancel,
        &mut |event| {
            let now = Instant::now();
            let elapsed_secs = now.duration_since(last_tick).as_secs_f32();
            last_tick = now;
            on_event(TrainEvent::Epoch(EpochRecord {
                epoch: event.epoch,
                loss: event.loss,
                elapsed_secs,
            }));
        },
    )?;
    let epochs_completed = match outcome {
        FitOutcome::Cancelled { epochs_completed } => {
            return Ok(stopped(epochs_completed));
        }
        FitOutcome::Completed => request.options.epochs,
    };
    if cancel.load(Ordering::Relaxed) {
        return Ok(stopped(epochs_completed));
    }

    on_event(TrainEvent::Saving);
    let evaluation = mlp::evaluate(&model, &dataset.test, request.options.batch_size)?;
    tracing::info!(
        "Test accuracy {:.4}, loss {:.4}",
        evaluation.accuracy,
        evaluation.loss
    );
    if cancel.load(Ordering::Relaxed) {
        return Ok(stopped(epochs_completed));
    }
    let entry = registry.save(&model, evaluation.accuracy)?;
    Ok(TrainOutcome::Saved { entry, evaluation })
}

fn stopped(epochs_completed: usize) -> TrainOutcome {
    tracing::info!("Training stopped after {epochs_completed} epoch(s)");
    TrainOutcome::Cancelled { epochs_completed }
}
