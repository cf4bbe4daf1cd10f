//! In-memory image datasets and the Fashion-MNIST loader.

mod fashion_mnist;
pub mod idx;

pub use fashion_mnist::{FashionMnist, FashionMnistFile, DEFAULT_BASE_URL};

use std::path::PathBuf;

use ndarray::Array2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },
    #[error("Failed to decompress dataset file: {0}")]
    Decompress(std::io::Error),
    #[error("Invalid IDX data: {0}")]
    InvalidIdx(String),
    #[error("Dataset mismatch: {0}")]
    Mismatch(String),
}

/// Grayscale images with one class label each; pixels are scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDataset {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, `len() * rows * cols` values.
    pub images: Vec<f32>,
    pub labels: Vec<u8>,
}

impl ImageDataset {
    /// Combine decoded IDX images and labels, checking that they line up.
    pub fn from_idx(images: idx::IdxImages, labels: Vec<u8>) -> Result<Self, DatasetError> {
        if images.count != labels.len() {
            return Err(DatasetError::Mismatch(format!(
                "{} images but {} labels",
                images.count,
                labels.len()
            )));
        }
        Ok(Self {
            rows: images.rows,
            cols: images.cols,
            images: images.pixels.iter().map(|&p| p as f32 / 255.0).collect(),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of input features per image.
    pub fn feature_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn image(&self, index: usize) -> &[f32] {
        let len = self.feature_len();
        &self.images[index * len..(index + 1) * len]
    }

    /// Verify the flat pixel buffer matches the label count.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.images.len() != self.len() * self.feature_len() {
            return Err(DatasetError::Mismatch(format!(
                "expected {} pixel values, found {}",
                self.len() * self.feature_len(),
                self.images.len()
            )));
        }
        Ok(())
    }

    /// Gather the given rows into a `[batch, features]` matrix plus labels.
    pub fn batch(&self, indices: &[usize]) -> (Array2<f32>, Vec<u8>) {
        let len = self.feature_len();
        let mut x = Array2::<f32>::zeros((indices.len(), len));
        let mut y = Vec::with_capacity(indices.len());
        for (row, &idx) in indices.iter().enumerate() {
            x.row_mut(row)
                .iter_mut()
                .zip(self.image(idx))
                .for_each(|(dst, &src)| *dst = src);
            y.push(self.labels[idx]);
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> ImageDataset {
        let images = idx::IdxImages {
            count: 3,
            rows: 1,
            cols: 2,
            pixels: vec![0, 255, 51, 102, 255, 0],
        };
        ImageDataset::from_idx(images, vec![0, 1, 2]).unwrap()
    }

    #[test]
    fn pixels_are_normalized() {
        let dataset = tiny();
        assert_eq!(dataset.image(0), &[0.0, 1.0]);
        assert!((dataset.image(1)[0] - 0.2).abs() < 1e-6);
        dataset.validate().unwrap();
    }

    #[test]
    fn batch_gathers_requested_rows_in_order() {
        let dataset = tiny();
        let (x, y) = dataset.batch(&[2, 0]);
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 0]], 1.0);
        assert_eq!(x[[1, 1]], 1.0);
        assert_eq!(y, vec![2, 0]);
    }

    #[test]
    fn label_count_mismatch_is_rejected() {
        let images = idx::IdxImages {
            count: 2,
            rows: 1,
            cols: 1,
            pixels: vec![0, 1],
        };
        assert!(matches!(
            ImageDataset::from_idx(images, vec![1]),
            Err(DatasetError::Mismatch(_))
        ));
    }
}
