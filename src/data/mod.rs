pub mod cifar;
pub mod dataset;
pub mod idx;

use std::path::Path;

pub use dataset::{Dataset, DatasetKind};

use crate::error::Result;

/// Loads the `(train, test)` splits of `kind` from `dir`.
pub fn load(kind: DatasetKind, dir: impl AsRef<Path>, normalize: bool) -> Result<(Dataset, Dataset)> {
    let dir = dir.as_ref();
    log::info!("loading {} from {}", kind.name(), dir.display());
    let (train, test) = match kind {
        DatasetKind::Mnist => idx::load_mnist(dir, normalize)?,
        DatasetKind::Cifar10 => cifar::load_cifar10(dir, normalize)?,
    };
    log::info!("  training set: {} images, test set: {} images", train.len(), test.len());
    Ok((train, test))
}
