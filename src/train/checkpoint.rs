//! Weights-only checkpoint files.
//!
//! ```text
//! bytes 0-3:  b"FLCK"
//! bytes 4-7:  format version (u32 LE, currently 1)
//! bytes 8-11: tensor count (u32 LE)
//! then per tensor: length (u32 LE) followed by that many f32 LE values
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, IoContext, Result};

const MAGIC: &[u8; 4] = b"FLCK";
const VERSION: u32 = 1;

/// `<dir>/<name>.<epoch:02>.ckpt`
pub fn checkpoint_path(dir: impl AsRef<Path>, name: &str, epoch: usize) -> PathBuf {
    dir.as_ref().join(format!("{}.{:02}.ckpt", name, epoch))
}

pub fn encode(tensors: &[&[f32]]) -> Vec<u8> {
    let total: usize = tensors.iter().map(|t| 4 + 4 * t.len()).sum();
    let mut out = Vec::with_capacity(12 + total);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(tensors.len() as u32).to_le_bytes());
    for t in tensors {
        out.extend_from_slice(&(t.len() as u32).to_le_bytes());
        for v in t.iter() {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}

fn read_u32(bytes: &[u8], at: &mut usize) -> Result<u32> {
    let end = *at + 4;
    let chunk = bytes
        .get(*at..end)
        .ok_or_else(|| Error::Checkpoint(format!("truncated at byte {}", *at)))?;
    *at = end;
    Ok(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Vec<f32>>> {
    if bytes.len() < 12 || &bytes[..4] != MAGIC {
        return Err(Error::Checkpoint("missing FLCK header".into()));
    }
    let mut at = 4;
    let version = read_u32(bytes, &mut at)?;
    if version != VERSION {
        return Err(Error::Checkpoint(format!("unsupported version {}", version)));
    }
    let count = read_u32(bytes, &mut at)? as usize;
    // every tensor needs at least its length word
    if count > (bytes.len() - at) / 4 {
        return Err(Error::Checkpoint(format!(
            "header claims {} tensors but only {} bytes follow",
            count,
            bytes.len() - at
        )));
    }

    let mut tensors = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_u32(bytes, &mut at)? as usize;
        let end = len
            .checked_mul(4)
            .and_then(|n| n.checked_add(at))
            .ok_or_else(|| Error::Checkpoint(format!("tensor of {} values is too large", len)))?;
        let data = bytes
            .get(at..end)
            .ok_or_else(|| Error::Checkpoint(format!("tensor of {} values truncated", len)))?;
        tensors.push(
            data.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        );
        at = end;
    }
    if at != bytes.len() {
        return Err(Error::Checkpoint(format!("{} trailing bytes", bytes.len() - at)));
    }
    Ok(tensors)
}

pub fn save(path: &Path, tensors: &[&[f32]]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).at_path(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path).at_path(path)?);
    writer.write_all(&encode(tensors)).at_path(path)?;
    writer.flush().at_path(path)?;
    log::debug!("wrote checkpoint {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<Vec<Vec<f32>>> {
    let bytes = std::fs::read(path).at_path(path)?;
    decode(&bytes)
}

/// Copies decoded tensors into a network's parameter slots, checking that
/// count and sizes agree.
pub fn restore(targets: &mut [&mut [f32]], tensors: Vec<Vec<f32>>) -> Result<()> {
    if targets.len() != tensors.len() {
        return Err(Error::Checkpoint(format!(
            "checkpoint holds {} tensors, network has {}",
            tensors.len(),
            targets.len()
        )));
    }
    for (i, (target, source)) in targets.iter().zip(&tensors).enumerate() {
        if target.len() != source.len() {
            return Err(Error::Checkpoint(format!(
                "tensor {}: checkpoint has {} values, network expects {}",
                i,
                source.len(),
                target.len()
            )));
        }
    }
    for (target, source) in targets.iter_mut().zip(tensors) {
        target.copy_from_slice(&source);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_pads_epoch_to_two_digits() {
        assert_eq!(checkpoint_path("checkpoints", "tf1", 7), PathBuf::from("checkpoints/tf1.07.ckpt"));
        assert_eq!(checkpoint_path("checkpoints_mlp", "tf_mlp", 100), PathBuf::from("checkpoints_mlp/tf_mlp.100.ckpt"));
    }

    #[test]
    fn decode_reverses_encode() {
        let a = [1.5f32, -2.0];
        let b = [f32::MIN_POSITIVE];
        let bytes = encode(&[&a, &b]);
        assert_eq!(decode(&bytes).unwrap(), vec![a.to_vec(), b.to_vec()]);
    }

    #[test]
    fn rejects_corrupt_files() {
        let bytes = encode(&[&[1.0, 2.0]]);
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(decode(b"NOPE\x01\x00\x00\x00\x00\x00\x00\x00").is_err());
        let mut extra = bytes.clone();
        extra.push(0);
        assert!(decode(&extra).is_err());
    }

    #[test]
    fn oversized_counts_are_errors_not_allocations() {
        let mut huge_count = MAGIC.to_vec();
        huge_count.extend_from_slice(&VERSION.to_le_bytes());
        huge_count.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&huge_count), Err(Error::Checkpoint(_))));

        let mut huge_tensor = MAGIC.to_vec();
        huge_tensor.extend_from_slice(&VERSION.to_le_bytes());
        huge_tensor.extend_from_slice(&1u32.to_le_bytes());
        huge_tensor.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&huge_tensor), Err(Error::Checkpoint(_))));
    }

    #[test]
    fn restore_checks_shapes() {
        let mut a = [0.0f32; 2];
        let mut targets: Vec<&mut [f32]> = vec![&mut a];
        assert!(restore(&mut targets, vec![vec![1.0]]).is_err());
        assert!(restore(&mut targets, vec![vec![1.0, 2.0], vec![]]).is_err());
        restore(&mut targets, vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(a, [1.0, 2.0]);
    }
}
