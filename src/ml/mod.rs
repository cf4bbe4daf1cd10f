//! Machine learning helpers for training and inference.
//!
//! A small dense network trained with mini-batch Adam, plus the metrics and
//! label table used to report on it.

pub mod labels;
pub mod metrics;
pub mod mlp;
