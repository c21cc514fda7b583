//! Minimal MATLAB Level 5 MAT-file support: one real `double` array per file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, IoContext, Result};
use crate::lsmap::gain_map::LensShadingMap;

/// Variable name the lens-shading map is stored under.
pub const LSMAP_FIELD: &str = "lens_shading_map";

const HEADER_LEN: usize = 128;
const HEADER_TEXT_LEN: usize = 116;
const VERSION: u16 = 0x0100;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

/// A named N-dimensional `f64` array in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub name: String,
    pub dims: Vec<usize>,
    pub data: Vec<f64>,
}

impl MatArray {
    /// Converts `(h, w, c)` row-major gains to a column-major `h×w×c` array.
    pub fn from_lens_shading_map(map: &LensShadingMap) -> MatArray {
        let (h, w, c) = map.shape();
        let mut data = vec![0.0; h * w * c];
        for y in 0..h {
            for x in 0..w {
                for k in 0..c {
                    data[y + h * (x + w * k)] = map.get(y, x, k) as f64;
                }
            }
        }
        MatArray { name: LSMAP_FIELD.to_string(), dims: vec![h, w, c], data }
    }

    /// Element at a 3-d index, column-major.
    pub fn get3(&self, y: usize, x: usize, k: usize) -> f64 {
        let (h, w) = (self.dims[0], self.dims[1]);
        self.data[y + h * (x + w * k)]
    }
}

fn padding(len: usize) -> usize {
    (8 - len % 8) % 8
}

fn tag(out: &mut Vec<u8>, ty: u32, len: usize) {
    out.extend_from_slice(&ty.to_le_bytes());
    out.extend_from_slice(&(len as u32).to_le_bytes());
}

fn sub_element(out: &mut Vec<u8>, ty: u32, payload: &[u8]) {
    tag(out, ty, payload.len());
    out.extend_from_slice(payload);
    out.resize(out.len() + padding(payload.len()), 0);
}

/// Serializes a complete MAT-file holding `array`.
pub fn encode(array: &MatArray) -> Result<Vec<u8>> {
    let expected: usize = array.dims.iter().product();
    if expected != array.data.len() {
        return Err(Error::MatFile(format!(
            "dims {:?} need {} values, got {}",
            array.dims,
            expected,
            array.data.len()
        )));
    }
    if array.name.is_empty() || !array.name.is_ascii() {
        return Err(Error::MatFile(format!("invalid variable name {:?}", array.name)));
    }

    let mut out = Vec::with_capacity(HEADER_LEN + 64 + 8 * array.data.len());
    let mut text = format!("MATLAB 5.0 MAT-file, Platform: {}, Created by: ferrite-lab", std::env::consts::OS)
        .into_bytes();
    text.resize(HEADER_TEXT_LEN, b' ');
    out.extend_from_slice(&text);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(b"IM");

    let mut body = Vec::new();
    let mut flags = Vec::with_capacity(8);
    flags.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    flags.extend_from_slice(&0u32.to_le_bytes());
    sub_element(&mut body, MI_UINT32, &flags);

    let dims: Vec<u8> = array.dims.iter().flat_map(|&d| (d as i32).to_le_bytes()).collect();
    sub_element(&mut body, MI_INT32, &dims);
    sub_element(&mut body, MI_INT8, array.name.as_bytes());
    let real: Vec<u8> = array.data.iter().flat_map(|v| v.to_le_bytes()).collect();
    sub_element(&mut body, MI_DOUBLE, &real);

    tag(&mut out, MI_MATRIX, body.len());
    out.extend_from_slice(&body);
    Ok(out)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let slice = self.bytes.get(self.at..self.at + n).ok_or_else(|| {
            Error::MatFile(format!("unexpected end of file at byte {}", self.at))
        })?;
        self.at += n;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads one tagged element of the given type, skipping its padding.
    fn element(&mut self, expected: u32) -> Result<&'a [u8]> {
        let ty = self.u32()?;
        let len = self.u32()? as usize;
        if ty != expected {
            return Err(Error::MatFile(format!("expected data type {}, found {}", expected, ty)));
        }
        let payload = self.take(len)?;
        self.take(padding(len))?;
        Ok(payload)
    }
}

/// Reads the first array from MAT-file bytes written by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<MatArray> {
    if bytes.len() < HEADER_LEN || &bytes[126..128] != b"IM" {
        return Err(Error::MatFile("not a little-endian Level 5 MAT-file".into()));
    }
    let mut cur = Cursor { bytes, at: HEADER_LEN };
    let matrix = cur.element(MI_MATRIX)?;
    let mut cur = Cursor { bytes: matrix, at: 0 };

    let flags = cur.element(MI_UINT32)?;
    let class = flags.first().copied().unwrap_or(0) as u32;
    if class != MX_DOUBLE_CLASS {
        return Err(Error::MatFile(format!("unsupported array class {}", class)));
    }
    let dims: Vec<usize> = cur
        .element(MI_INT32)?
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize)
        .collect();
    let name = String::from_utf8_lossy(cur.element(MI_INT8)?).into_owned();
    let data: Vec<f64> = cur
        .element(MI_DOUBLE)?
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();

    if dims.iter().product::<usize>() != data.len() {
        return Err(Error::MatFile(format!("dims {:?} do not match {} values", dims, data.len())));
    }
    Ok(MatArray { name, dims, data })
}

pub fn write_mat(path: &Path, array: &MatArray) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).at_path(parent)?;
    }
    let bytes = encode(array)?;
    let mut w = BufWriter::new(File::create(path).at_path(path)?);
    w.write_all(&bytes).at_path(path)?;
    w.flush().at_path(path)?;
    Ok(())
}

pub fn read_mat(path: &Path) -> Result<MatArray> {
    decode(&fs::read(path).at_path(path)?)
}

/// Writes `map` under [`LSMAP_FIELD`].
pub fn save_lens_shading_map(path: &Path, map: &LensShadingMap) -> Result<()> {
    write_mat(path, &MatArray::from_lens_shading_map(map))?;
    log::info!("wrote {} ({}×{}×{})", path.display(), map.height, map.width, map.channels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsmap::gain_map::{synthetic_gain_map, LensShadingMap};

    fn sample_map() -> LensShadingMap {
        let maps: Vec<_> = [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .enumerate()
            .map(|(c, &(t, l))| synthetic_gain_map(t, l, 3, 5, 1.0 + 0.1 * c as f32))
            .collect();
        LensShadingMap::from_gain_maps(&maps).unwrap()
    }

    #[test]
    fn header_is_level_five_little_endian() {
        let bytes = encode(&MatArray::from_lens_shading_map(&sample_map())).unwrap();
        assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file"));
        assert_eq!(&bytes[124..126], &[0x00, 0x01]);
        assert_eq!(&bytes[126..128], b"IM");
        assert_eq!(u32::from_le_bytes([bytes[128], bytes[129], bytes[130], bytes[131]]), MI_MATRIX);
        assert_eq!(bytes.len() % 8, 0);
    }

    #[test]
    fn saved_map_reads_back_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("IMG_0001.mat");
        let map = sample_map();
        save_lens_shading_map(&path, &map).unwrap();

        let arr = read_mat(&path).unwrap();
        assert_eq!(arr.name, LSMAP_FIELD);
        assert_eq!(arr.dims, vec![3, 5, 4]);
        for y in 0..3 {
            for x in 0..5 {
                for c in 0..4 {
                    assert_eq!(arr.get3(y, x, c), map.get(y, x, c) as f64);
                }
            }
        }
    }

    #[test]
    fn rejects_inconsistent_arrays_and_garbage() {
        let bad = MatArray { name: "x".into(), dims: vec![2, 2], data: vec![0.0; 3] };
        assert!(matches!(encode(&bad), Err(Error::MatFile(_))));
        assert!(decode(b"not a mat file").is_err());

        let good = MatArray { name: "x".into(), dims: vec![1, 2], data: vec![1.0, 2.0] };
        let bytes = encode(&good).unwrap();
        assert!(decode(&bytes[..bytes.len() - 8]).is_err());
        assert_eq!(decode(&bytes).unwrap(), good);
    }
}
