use std::path::Path;

use crate::http_client::{self, RetryConfig};

use super::{DatasetError, ImageDataset, idx};

/// Public mirror of the Zalando Fashion-MNIST archives.
pub const DEFAULT_BASE_URL: &str = "http://fashion-mnist.s3-website.eu-central-1.amazonaws.com";
const MAX_ARCHIVE_BYTES: usize = 64 * 1024 * 1024;

/// The four archives making up the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FashionMnistFile {
    TrainImages,
    TrainLabels,
    TestImages,
    TestLabels,
}

impl FashionMnistFile {
    pub const ALL: [FashionMnistFile; 4] = [
        FashionMnistFile::TrainImages,
        FashionMnistFile::TrainLabels,
        FashionMnistFile::TestImages,
        FashionMnistFile::TestLabels,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            FashionMnistFile::TrainImages => "train-images-idx3-ubyte.gz",
            FashionMnistFile::TrainLabels => "train-labels-idx1-ubyte.gz",
            FashionMnistFile::TestImages => "t10k-images-idx3-ubyte.gz",
            FashionMnistFile::TestLabels => "t10k-labels-idx1-ubyte.gz",
        }
    }
}

/// Train/test split of Fashion-MNIST.
#[derive(Debug, Clone)]
pub struct FashionMnist {
    pub train: ImageDataset,
    pub test: ImageDataset,
}

impl FashionMnist {
    /// Load the cached archives from `dir`, downloading any that are missing.
    pub fn load_or_download(
        dir: &Path,
        on_status: &mut dyn FnMut(String),
    ) -> Result<Self, DatasetError> {
        Self::load_or_download_from(dir, DEFAULT_BASE_URL, on_status)
    }

    /// Same as [`FashionMnist::load_or_download`] with an explicit mirror.
    pub fn load_or_download_from(
        dir: &Path,
        base_url: &str,
        on_status: &mut dyn FnMut(String),
    ) -> Result<Self, DatasetError> {
        std::fs::create_dir_all(dir).map_err(|source| DatasetError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        for file in FashionMnistFile::ALL {
            let path = dir.join(file.file_name());
            if path.is_file() {
                continue;
            }
            on_status(format!("Downloading {}…", file.file_name()));
            download(base_url, file, &path)?;
        }
        on_status("Decoding dataset…".to_string());
        Self::load_from_dir(dir)
    }

    /// Decode all four archives from `dir` without touching the network.
    pub fn load_from_dir(dir: &Path) -> Result<Self, DatasetError> {
        let train = load_split(
            dir,
            FashionMnistFile::TrainImages,
            FashionMnistFile::TrainLabels,
        )?;
        let test = load_split(
            dir,
            FashionMnistFile::TestImages,
            FashionMnistFile::TestLabels,
        )?;
        if train.feature_len() != test.feature_len() {
            return Err(DatasetError::Mismatch(format!(
                "train images are {}x{} but test images are {}x{}",
                train.rows, train.cols, test.rows, test.cols
            )));
        }
        tracing::info!(
            "Loaded Fashion-MNIST: {} train / {} test samples",
            train.len(),
            test.len()
        );
        Ok(Self { train, test })
    }
}

fn load_split(
    dir: &Path,
    images: FashionMnistFile,
    labels: FashionMnistFile,
) -> Result<ImageDataset, DatasetError> {
    let images = idx::parse_images(&read_file(&dir.join(images.file_name()))?)?;
    let labels = idx::parse_labels(&read_file(&dir.join(labels.file_name()))?)?;
    ImageDataset::from_idx(images, labels)
}

fn read_file(path: &Path) -> Result<Vec<u8>, DatasetError> {
    std::fs::read(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn download(base_url: &str, file: FashionMnistFile, dest: &Path) -> Result<(), DatasetError> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), file.file_name());
    tracing::info!("Downloading {url}");
    http_client::retry_with_backoff(
        RetryConfig::default(),
        || http_client::download_to_file(&url, dest, MAX_ARCHIVE_BYTES),
        |err| err.kind() != std::io::ErrorKind::InvalidData,
    )
    .map_err(|err| DatasetError::Download {
        url: url.clone(),
        message: err.to_string(),
    })
}
