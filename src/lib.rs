//! Library exports for the desktop trainer, the headless binary and tests.
/// Application folder resolution.
pub mod app_dirs;
/// Persisted settings.
pub mod config;
/// Fashion-MNIST download and decoding.
pub mod dataset;
/// Shared egui UI modules.
pub mod egui_app;
mod http_client;
/// Image classification with saved models.
pub mod inference;
/// Tracing subscriber setup.
pub mod logging;
/// Network definition, training and metrics.
pub mod ml;
/// Saved model artifacts on disk.
pub mod model_store;
/// Train/stop state machine.
pub mod session;
/// End-to-end training pipeline.
pub mod trainer;
