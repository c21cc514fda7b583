//! CIFAR-10 binary batches.
//!
//! Each record is one label byte followed by 3072 pixel bytes: the red,
//! green and blue 32×32 planes in row-major order. That is already the
//! channel-major layout `Tensor3` uses.

use std::path::Path;

use crate::data::dataset::{pixels_to_f32, Dataset};
use crate::error::{Error, IoContext, Result};
use crate::math::Shape;

pub const SIDE: usize = 32;
pub const CHANNELS: usize = 3;
pub const RECORD_LEN: usize = 1 + CHANNELS * SIDE * SIDE;

pub const TRAIN_BATCHES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
pub const TEST_BATCH: &str = "test_batch.bin";

/// Parses any number of concatenated records.
pub fn parse_batch(bytes: &[u8], normalize: bool) -> Result<Dataset> {
    if bytes.len() % RECORD_LEN != 0 {
        return Err(Error::Dataset(format!(
            "CIFAR-10 batch is {} bytes, not a multiple of the {}-byte record size.",
            bytes.len(),
            RECORD_LEN
        )));
    }

    let n = bytes.len() / RECORD_LEN;
    let mut labels = Vec::with_capacity(n);
    let mut pixels = Vec::with_capacity(n * (RECORD_LEN - 1));
    for (i, record) in bytes.chunks_exact(RECORD_LEN).enumerate() {
        if record[0] >= 10 {
            return Err(Error::Dataset(format!(
                "CIFAR-10 record {}: label {} is out of range.", i, record[0]
            )));
        }
        labels.push(record[0]);
        pixels.extend_from_slice(&record[1..]);
    }

    Ok(Dataset::new(
        Shape::new(CHANNELS, SIDE, SIDE),
        pixels_to_f32(&pixels, normalize),
        labels,
        10,
    ))
}

fn read_batches(dir: &Path, names: &[&str], normalize: bool) -> Result<Dataset> {
    let mut bytes = Vec::new();
    for name in names {
        let path = dir.join(name);
        let mut chunk = std::fs::read(&path).at_path(&path)?;
        log::debug!("read {} ({} bytes)", path.display(), chunk.len());
        bytes.append(&mut chunk);
    }
    parse_batch(&bytes, normalize)
}

/// Loads the five training batches and the test batch from `dir`.
pub fn load_cifar10(dir: impl AsRef<Path>, normalize: bool) -> Result<(Dataset, Dataset)> {
    let dir = dir.as_ref();
    let train = read_batches(dir, &TRAIN_BATCHES, normalize)?;
    let test = read_batches(dir, &[TEST_BATCH], normalize)?;
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: u8, fill: u8) -> Vec<u8> {
        let mut r = vec![fill; RECORD_LEN];
        r[0] = label;
        r
    }

    #[test]
    fn parses_records_channel_major() {
        let mut bytes = record(3, 0);
        bytes[1 + 1024] = 255; // first green pixel
        bytes.extend(record(9, 255));
        let ds = parse_batch(&bytes, true).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels, vec![3, 9]);
        assert_eq!(ds.image(0)[1024], 1.0);
        assert_eq!(ds.image(0)[0], 0.0);
    }

    #[test]
    fn rejects_partial_records() {
        let bytes = vec![0u8; RECORD_LEN + 5];
        assert!(matches!(parse_batch(&bytes, true), Err(Error::Dataset(_))));
    }

    #[test]
    fn rejects_bad_labels() {
        assert!(parse_batch(&record(10, 0), true).is_err());
    }
}
