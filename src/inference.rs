//! Turn a user-supplied picture into a class prediction.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use thiserror::Error;

use crate::ml::labels;
use crate::ml::mlp::SequentialModel;

/// Side length of the square grayscale input the network expects.
pub const IMAGE_SIDE: u32 = 28;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to open image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Model expects {expected} inputs but images have {found}")]
    InputMismatch { expected: usize, found: usize },
    #[error("Model produced no output")]
    NoOutput,
}

/// Normalized network input plus the downscaled grayscale preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    /// `IMAGE_SIDE * IMAGE_SIDE` values in `[0, 1]`, row-major.
    pub input: Vec<f32>,
    /// Same pixels as bytes, for display.
    pub preview: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub label: &'static str,
    pub confidence: f32,
}

impl Prediction {
    pub fn message(&self) -> String {
        format!("It's a {}", self.label)
    }
}

/// Decode any format the `image` crate reads, convert to luma and resize.
pub fn prepare_image(path: &Path) -> Result<PreparedImage, InferenceError> {
    let decoded = image::open(path).map_err(|source| InferenceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = decoded.to_luma8();
    let resized = if gray.dimensions() == (IMAGE_SIDE, IMAGE_SIDE) {
        gray
    } else {
        image::imageops::resize(&gray, IMAGE_SIDE, IMAGE_SIDE, FilterType::Triangle)
    };
    let preview = resized.into_raw();
    let input = preview.iter().map(|&p| p as f32 / 255.0).collect();
    Ok(PreparedImage { input, preview })
}

/// Run `model` on a prepared image and map the winning class to its label.
pub fn predict_label(
    model: &SequentialModel,
    prepared: &PreparedImage,
) -> Result<Prediction, InferenceError> {
    if model.input_len() != prepared.input.len() {
        return Err(InferenceError::InputMismatch {
            expected: model.input_len(),
            found: prepared.input.len(),
        });
    }
    let proba = model.predict_proba(&prepared.input);
    let (index, confidence) = proba
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (idx, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((idx, p)),
        })
        .ok_or(InferenceError::NoOutput)?;
    let label = labels::label_for(index).unwrap_or("unknown item");
    tracing::info!("Predicted {label} (class {index}, p={confidence:.3})");
    Ok(Prediction {
        index,
        label,
        confidence,
    })
}
