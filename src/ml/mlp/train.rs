use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2, Axis, Ix1, Ix2, Zip};
use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use thiserror::Error;

use crate::dataset::ImageDataset;
use crate::ml::metrics::{self, ConfusionMatrix};

use super::model::{Activation, SequentialModel, argmax};
use super::optimizer::{Adam, Moments};

/// Floor applied to probabilities before taking the log.
const MIN_PROB: f32 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    pub seed: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 100,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            seed: 42,
        }
    }
}

/// Reported once per finished epoch; `epoch` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochEvent {
    pub epoch: usize,
    pub loss: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    Completed,
    Cancelled { epochs_completed: usize },
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub accuracy: f32,
    pub loss: f32,
    pub confusion: ConfusionMatrix,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("Dataset has {found} features per sample but the model expects {expected}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("Label {label} is outside the model's {classes} classes")]
    LabelOutOfRange { label: u8, classes: usize },
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Invalid training options: {0}")]
    InvalidOptions(String),
    #[error("Loss diverged in epoch {epoch}")]
    Diverged { epoch: usize },
}

struct LayerState {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
    weight_moments: Moments<Ix2>,
    bias_moments: Moments<Ix1>,
}

/// Train `model` in place with mini-batch Adam on softmax cross-entropy.
///
/// `cancel` is polled before every mini-batch. When it is set the partially
/// trained weights are kept and `FitOutcome::Cancelled` is returned.
pub fn fit(
    model: &mut SequentialModel,
    dataset: &ImageDataset,
    options: &FitOptions,
    cancel: &AtomicBool,
    on_epoch: &mut dyn FnMut(EpochEvent),
) -> Result<FitOutcome, TrainError> {
    check_inputs(model, dataset)?;
    check_options(options)?;
    let mut layers = layer_states(model)?;
    let mut adam = Adam::new(
        options.learning_rate,
        options.beta1,
        options.beta2,
        options.epsilon,
    );
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let mut outcome = FitOutcome::Completed;

    'epochs: for epoch in 1..=options.epochs {
        indices.shuffle(&mut rng);
        let mut loss_sum = 0.0f64;
        let mut batches = 0usize;
        for batch in indices.chunks(options.batch_size) {
            if cancel.load(Ordering::Relaxed) {
                outcome = FitOutcome::Cancelled {
                    epochs_completed: epoch - 1,
                };
                break 'epochs;
            }
            let (x, y) = dataset.batch(batch);
            adam.next_step();
            loss_sum += train_batch(&mut layers, &adam, x, &y) as f64;
            batches += 1;
        }
        let loss = (loss_sum / batches.max(1) as f64) as f32;
        if !loss.is_finite() {
            write_back(model, &layers);
            return Err(TrainError::Diverged { epoch });
        }
        tracing::debug!("Epoch {epoch}/{}: loss {loss:.4}", options.epochs);
        on_epoch(EpochEvent { epoch, loss });
    }

    write_back(model, &layers);
    Ok(outcome)
}

/// Score `model` on `dataset`, reporting accuracy and mean cross-entropy.
pub fn evaluate(
    model: &SequentialModel,
    dataset: &ImageDataset,
    batch_size: usize,
) -> Result<Evaluation, TrainError> {
    check_inputs(model, dataset)?;
    let mut confusion = ConfusionMatrix::new(model.output_len());
    let mut loss_sum = 0.0f64;
    let indices: Vec<usize> = (0..dataset.len()).collect();
    for batch in indices.chunks(batch_size.max(1)) {
        let (x, y) = dataset.batch(batch);
        let output = model
            .forward_batch(x.view())
            .map_err(TrainError::InvalidModel)?;
        let probs = softmax_rows(&output);
        for (row, &label) in probs.rows().into_iter().zip(&y) {
            let row = row.to_vec();
            loss_sum -= row[label as usize].max(MIN_PROB).ln() as f64;
            if let Some(predicted) = argmax(&row) {
                confusion.add(label as usize, predicted);
            }
        }
    }
    Ok(Evaluation {
        accuracy: metrics::accuracy(&confusion),
        loss: (loss_sum / dataset.len() as f64) as f32,
        confusion,
    })
}

fn check_inputs(model: &SequentialModel, dataset: &ImageDataset) -> Result<(), TrainError> {
    model.validate().map_err(TrainError::InvalidModel)?;
    if dataset.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    dataset
        .validate()
        .map_err(|err| TrainError::InvalidDataset(err.to_string()))?;
    if dataset.feature_len() != model.input_len() {
        return Err(TrainError::FeatureMismatch {
            expected: model.input_len(),
            found: dataset.feature_len(),
        });
    }
    let classes = model.output_len();
    if let Some(&label) = dataset.labels.iter().find(|&&l| l as usize >= classes) {
        return Err(TrainError::LabelOutOfRange { label, classes });
    }
    Ok(())
}

fn check_options(options: &FitOptions) -> Result<(), TrainError> {
    if options.epochs == 0 {
        return Err(TrainError::InvalidOptions("epochs must be at least 1".into()));
    }
    if options.batch_size == 0 {
        return Err(TrainError::InvalidOptions("batch size must be at least 1".into()));
    }
    if !(options.learning_rate.is_finite() && options.learning_rate > 0.0) {
        return Err(TrainError::InvalidOptions(format!(
            "learning rate must be positive (got {})",
            options.learning_rate
        )));
    }
    Ok(())
}

fn layer_states(model: &SequentialModel) -> Result<Vec<LayerState>, TrainError> {
    model
        .layers
        .iter()
        .map(|layer| {
            let weights =
                Array2::from_shape_vec((layer.input_size, layer.output_size), layer.weights.clone())
                    .map_err(|err| TrainError::InvalidModel(err.to_string()))?;
            let bias = Array1::from(layer.bias.clone());
            Ok(LayerState {
                weight_moments: Moments::zeros_like(&weights),
                bias_moments: Moments::zeros_like(&bias),
                weights,
                bias,
                activation: layer.activation,
            })
        })
        .collect()
}

fn write_back(model: &mut SequentialModel, layers: &[LayerState]) {
    for (dst, src) in model.layers.iter_mut().zip(layers) {
        dst.weights = src.weights.iter().copied().collect();
        dst.bias = src.bias.to_vec();
    }
}

/// One forward/backward pass and Adam update; returns the mean batch loss.
fn train_batch(layers: &mut [LayerState], adam: &Adam, x: Array2<f32>, y: &[u8]) -> f32 {
    let mut activations = Vec::with_capacity(layers.len() + 1);
    activations.push(x);
    for layer in layers.iter() {
        let mut z = activations[activations.len() - 1].dot(&layer.weights);
        z += &layer.bias;
        let activation = layer.activation;
        z.mapv_inplace(|v| activation.apply(v));
        activations.push(z);
    }

    let batch = y.len().max(1) as f32;
    let mut delta = softmax_rows(&activations[layers.len()]);
    let mut loss = 0.0f32;
    for (row, &label) in y.iter().enumerate() {
        let p = delta[[row, label as usize]];
        loss -= p.max(MIN_PROB).ln();
        delta[[row, label as usize]] -= 1.0;
    }
    delta.mapv_inplace(|v| v / batch);

    for idx in (0..layers.len()).rev() {
        let activation = layers[idx].activation;
        Zip::from(&mut delta)
            .and(&activations[idx + 1])
            .for_each(|d, &out| *d *= activation.derivative(out));
        let grad_w = activations[idx].t().dot(&delta);
        let grad_b = delta.sum_axis(Axis(0));
        let upstream = (idx > 0).then(|| delta.dot(&layers[idx].weights.t()));

        let layer = &mut layers[idx];
        adam.update(&mut layer.weights, &grad_w, &mut layer.weight_moments);
        adam.update(&mut layer.bias, &grad_b, &mut layer.bias_moments);
        match upstream {
            Some(next) => delta = next,
            None => break,
        }
    }
    loss / batch
}

fn softmax_rows(values: &Array2<f32>) -> Array2<f32> {
    let mut out = values.to_owned();
    for mut row in out.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    out
}
