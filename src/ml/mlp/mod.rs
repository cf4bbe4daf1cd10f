//! Dense feed-forward classifier trained on flattened images.

mod model;
mod optimizer;
mod train;

pub use model::{Activation, DenseLayer, MODEL_VERSION, SequentialModel, softmax};
pub use train::{EpochEvent, Evaluation, FitOptions, FitOutcome, TrainError, evaluate, fit};
