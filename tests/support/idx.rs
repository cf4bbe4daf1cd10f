use std::io::Write;
use std::path::Path;

use fashion_trainer::dataset::FashionMnistFile;
use flate2::{Compression, write::GzEncoder};

const SIDE: u32 = 28;

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

fn images(count: usize) -> Vec<u8> {
    let mut out = vec![0, 0, 0x08, 3];
    for dim in [count as u32, SIDE, SIDE] {
        out.extend_from_slice(&dim.to_be_bytes());
    }
    // Class k lights up row k so a small network can tell them apart.
    for sample in 0..count {
        let class = sample % 10;
        for row in 0..SIDE as usize {
            let value = if row / 2 == class { 255 } else { 0 };
            out.extend(std::iter::repeat_n(value, SIDE as usize));
        }
    }
    out
}

fn labels(count: usize) -> Vec<u8> {
    let mut out = vec![0, 0, 0x08, 1];
    out.extend_from_slice(&(count as u32).to_be_bytes());
    out.extend((0..count).map(|i| (i % 10) as u8));
    out
}

/// Write all four gzipped Fashion-MNIST archives with synthetic 28x28 images.
pub fn write_synthetic_dataset(dir: &Path, train: usize, test: usize) {
    std::fs::create_dir_all(dir).expect("create dataset dir");
    let files = [
        (FashionMnistFile::TrainImages, images(train)),
        (FashionMnistFile::TrainLabels, labels(train)),
        (FashionMnistFile::TestImages, images(test)),
        (FashionMnistFile::TestLabels, labels(test)),
    ];
    for (file, bytes) in files {
        std::fs::write(dir.join(file.file_name()), gzip(&bytes)).expect("write archive");
    }
}
