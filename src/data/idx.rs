//! IDX binary files as used by MNIST and its derivatives.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index in [0, n_classes)
//! ```

use std::path::Path;

use crate::data::dataset::{pixels_to_f32, Dataset};
use crate::error::{Error, IoContext, Result};
use crate::math::Shape;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn check_magic(bytes: &[u8], what: &str, dims: u8) -> Result<()> {
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            what, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            what, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 3 (dimensions) must be {}, got {}.",
            what, dims, bytes[3]
        )));
    }
    Ok(())
}

/// Parses an image + label IDX pair into a single-channel `Dataset`.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
    normalize: bool,
) -> Result<Dataset> {
    // ── Image file validation ───────────────────────────────────────────────

    if image_bytes.len() < 16 {
        return Err(Error::Dataset(format!(
            "IDX image file too short: expected at least 16 header bytes, got {}.",
            image_bytes.len()
        )));
    }
    check_magic(image_bytes, "image", 0x03)?;

    let n_items = be_u32(image_bytes, 4);
    let rows = be_u32(image_bytes, 8);
    let cols = be_u32(image_bytes, 12);

    let data_len = rows
        .checked_mul(cols)
        .and_then(|px| px.checked_mul(n_items))
        .ok_or_else(|| Error::Dataset(format!(
            "IDX image file: {} items of {}×{} overflows usize.", n_items, rows, cols
        )))?;

    if image_bytes.len() < 16 + data_len {
        return Err(Error::Dataset(format!(
            "IDX image file too short: header declares {} items of {}×{} pixels \
             ({} data bytes needed after header), but file is only {} bytes total.",
            n_items, rows, cols, data_len, image_bytes.len()
        )));
    }

    // ── Label file validation ───────────────────────────────────────────────

    if label_bytes.len() < 8 {
        return Err(Error::Dataset(format!(
            "IDX label file too short: expected at least 8 header bytes, got {}.",
            label_bytes.len()
        )));
    }
    check_magic(label_bytes, "label", 0x01)?;

    let label_count = be_u32(label_bytes, 4);
    if label_count != n_items {
        return Err(Error::Dataset(format!(
            "IDX file mismatch: image file declares {} items but label file declares {}.",
            n_items, label_count
        )));
    }
    if label_bytes.len() < 8 + n_items {
        return Err(Error::Dataset(format!(
            "IDX label file too short: header declares {} labels but file is only {} bytes.",
            n_items, label_bytes.len()
        )));
    }

    let labels = label_bytes[8..8 + n_items].to_vec();
    if let Some((i, &class)) = labels.iter().enumerate().find(|(_, c)| **c as usize >= n_classes) {
        return Err(Error::Dataset(format!(
            "IDX label at index {}: class index {} is out of range for n_classes={}.",
            i, class, n_classes
        )));
    }

    let images = pixels_to_f32(&image_bytes[16..16 + data_len], normalize);
    Ok(Dataset::new(Shape::new(1, rows, cols), images, labels, n_classes))
}

/// Reads one image/label file pair from disk.
pub fn read_idx_pair(
    images: impl AsRef<Path>,
    labels: impl AsRef<Path>,
    n_classes: usize,
    normalize: bool,
) -> Result<Dataset> {
    let (images, labels) = (images.as_ref(), labels.as_ref());
    let image_bytes = std::fs::read(images).at_path(images)?;
    let label_bytes = std::fs::read(labels).at_path(labels)?;
    parse_idx_pair(&image_bytes, &label_bytes, n_classes, normalize)
}

/// Loads the MNIST train and test splits from `dir`.
pub fn load_mnist(dir: impl AsRef<Path>, normalize: bool) -> Result<(Dataset, Dataset)> {
    let dir = dir.as_ref();
    let train = read_idx_pair(dir.join(TRAIN_IMAGES), dir.join(TRAIN_LABELS), 10, normalize)?;
    let test = read_idx_pair(dir.join(TEST_IMAGES), dir.join(TEST_LABELS), 10, normalize)?;
    if train.shape != Shape::new(1, 28, 28) {
        log::warn!("MNIST images in {} are {:?}, expected 28×28", dir.display(), train.shape);
    }
    Ok((train, test))
}

/// Test support: encodes images and labels as an IDX pair. Loading never
/// calls this.
#[doc(hidden)]
pub fn encode_idx_pair(rows: usize, cols: usize, pixels: &[u8], labels: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut image_bytes = vec![0x00, 0x00, 0x08, 0x03];
    for v in [labels.len(), rows, cols] {
        image_bytes.extend_from_slice(&(v as u32).to_be_bytes());
    }
    image_bytes.extend_from_slice(pixels);

    let mut label_bytes = vec![0x00, 0x00, 0x08, 0x01];
    label_bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    label_bytes.extend_from_slice(labels);
    (image_bytes, label_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_pair() {
        let (img, lbl) = encode_idx_pair(2, 2, &[0, 255, 0, 255, 255, 0, 255, 0], &[1, 7]);
        let ds = parse_idx_pair(&img, &lbl, 10, true).unwrap();
        assert_eq!(ds.shape, Shape::new(1, 2, 2));
        assert_eq!(ds.labels, vec![1, 7]);
        assert_eq!(ds.image(1), &[1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_dimension_byte() {
        let (mut img, lbl) = encode_idx_pair(1, 1, &[0], &[0]);
        img[3] = 0x02;
        assert!(matches!(parse_idx_pair(&img, &lbl, 10, true), Err(Error::Dataset(_))));
    }

    #[test]
    fn rejects_count_mismatch_and_truncation() {
        let (img, _) = encode_idx_pair(1, 1, &[0, 0], &[0, 0]);
        let (_, lbl) = encode_idx_pair(1, 1, &[0], &[0]);
        assert!(parse_idx_pair(&img, &lbl, 10, true).is_err());

        let (img, lbl) = encode_idx_pair(2, 2, &[0, 0, 0, 0], &[0]);
        assert!(parse_idx_pair(&img[..18], &lbl, 10, true).is_err());
    }

    #[test]
    fn rejects_out_of_range_label() {
        let (img, lbl) = encode_idx_pair(1, 1, &[0], &[10]);
        assert!(parse_idx_pair(&img, &lbl, 10, true).is_err());
    }

    #[test]
    fn loads_splits_from_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (img, lbl) = encode_idx_pair(28, 28, &[0u8; 784], &[4]);
        for (name, bytes) in [(TRAIN_IMAGES, &img), (TRAIN_LABELS, &lbl), (TEST_IMAGES, &img), (TEST_LABELS, &lbl)] {
            std::fs::write(dir.path().join(name), bytes).unwrap();
        }
        let (train, test) = load_mnist(dir.path(), true).unwrap();
        assert_eq!((train.len(), test.len()), (1, 1));
        assert_eq!(train.label(0), 4);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        match load_mnist(dir.path(), true) {
            Err(Error::Io { path, .. }) => assert!(path.ends_with(TRAIN_IMAGES)),
            other => panic!("expected Io error, got {:?}", other.map(|_| ())),
        }
    }
}
