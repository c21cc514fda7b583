//! Lens-shading map extraction from DNG files.
//!
//! ExifTool prints the `OpcodeList2` tag, the GainMap opcodes inside it are
//! parsed into an `(height, width, channels)` map, and the map is saved as a
//! MAT-file next to an optional PNG preview.

pub mod dump;
pub mod exiftool;
pub mod gain_map;
pub mod matfile;
pub mod preview;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub use dump::OpcodeDump;
pub use exiftool::{Decoder, ExifTool, OpcodeSource};
pub use gain_map::{BayerGrid, GainMap, LensShadingMap};
pub use matfile::{read_mat, save_lens_shading_map, MatArray, LSMAP_FIELD};

/// Options for [`extract_to_dir`].
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Reorder channels into canonical Bayer phase order.
    pub rectify: bool,
    /// Also write `<stem>.png`.
    pub preview: bool,
}

pub fn extract_lens_shading_map(source: &dyn OpcodeSource, path: &Path, rectify: bool) -> Result<LensShadingMap> {
    let dump = source.opcode_dump(path)?;
    log::debug!("{}: {} opcode words", path.display(), dump.len());
    let map = LensShadingMap::from_dump(&dump)?;
    if rectify { map.rectified() } else { Ok(map) }
}

/// `<out_dir>/<stem>.<ext>`; `out_dir` defaults to the input's directory.
pub fn output_path(input: &Path, out_dir: Option<&Path>, ext: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::Config(format!("{} has no file name", input.display())))?;
    let dir = match out_dir {
        Some(d) => d.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(stem).with_extension(ext))
}

/// Extracts one file and writes `<stem>.mat`. Returns the written path.
pub fn extract_to_dir(
    source: &dyn OpcodeSource,
    input: &Path,
    out_dir: Option<&Path>,
    opts: &ExtractOptions,
) -> Result<PathBuf> {
    let map = extract_lens_shading_map(source, input, opts.rectify)?;
    let mat = output_path(input, out_dir, "mat")?;
    save_lens_shading_map(&mat, &map)?;
    if opts.preview {
        preview::save_preview(&map, &output_path(input, out_dir, "png")?)?;
    }
    Ok(mat)
}

/// Reads a written map back and describes it as `shape (h, w, c), [0][0][0] = v`.
pub fn saved_summary(mat: &Path) -> Result<String> {
    let arr = read_mat(mat)?;
    let dims: Vec<String> = arr.dims.iter().map(usize::to_string).collect();
    let first = arr
        .data
        .first()
        .ok_or_else(|| Error::MatFile(format!("{} holds an empty array", mat.display())))?;
    Ok(format!("shape ({}), [0][0][0] = {}", dims.join(", "), first))
}
