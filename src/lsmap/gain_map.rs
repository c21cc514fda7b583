//! DNG `GainMap` opcodes and the lens-shading map assembled from them.
//!
//! An opcode list starts with the opcode count. Each opcode then carries
//! `id, version, flags, param_bytes` followed by `param_bytes` of
//! parameters. For a GainMap (id 9) those are:
//!
//! ```text
//! top left bottom right plane planes row_pitch col_pitch   8 × u32
//! map_points_v map_points_h                                 2 × u32
//! map_spacing_v map_spacing_h map_origin_v map_origin_h     4 × f64
//! map_planes                                                1 × u32
//! gains                                                     v × h × planes × f32
//! ```
//!
//! so one GainMap is 23 header words followed by its gains.

use crate::error::{Error, Result};
use crate::lsmap::dump::OpcodeDump;

pub const GAIN_MAP_ID: u32 = 9;
/// Words from the opcode id through `map_planes`.
pub const GAIN_MAP_HEADER_WORDS: usize = 23;
const GAIN_MAP_FIXED_PARAM_BYTES: usize = 76;

/// One parsed GainMap opcode.
#[derive(Debug, Clone, PartialEq)]
pub struct GainMap {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
    pub plane: u32,
    pub planes: u32,
    pub row_pitch: u32,
    pub col_pitch: u32,
    pub map_points_v: usize,
    pub map_points_h: usize,
    pub spacing_v: f64,
    pub spacing_h: f64,
    pub origin_v: f64,
    pub origin_h: f64,
    pub map_planes: usize,
    pub gains: Vec<f32>,
}

impl GainMap {
    /// Bayer phase `(row, col)` of the pixels this map applies to.
    pub fn phase(&self) -> (usize, usize) {
        ((self.top % 2) as usize, (self.left % 2) as usize)
    }
}

fn word(dump: &OpcodeDump, at: usize) -> Result<u32> {
    dump.words.get(at).copied().ok_or_else(|| {
        Error::OpcodeLayout(format!("dump ends at word {} while reading an opcode header", at))
    })
}

/// Parses every GainMap in the dump. Other opcodes are skipped with a
/// warning; the dump must end exactly where the last opcode does.
pub fn parse_gain_maps(dump: &OpcodeDump) -> Result<Vec<GainMap>> {
    let count = word(dump, 0)? as usize;
    let mut at = 1;
    let mut maps = Vec::new();

    for index in 0..count {
        let id = word(dump, at)?;
        let param_bytes = word(dump, at + 3)? as usize;
        if param_bytes % 4 != 0 {
            return Err(Error::OpcodeLayout(format!(
                "opcode {} declares {} parameter bytes, not a whole number of words",
                index, param_bytes
            )));
        }
        let params = at + 4;
        let next = params + param_bytes / 4;

        if id != GAIN_MAP_ID {
            log::warn!("skipping opcode {} with id {} (not a GainMap)", index, id);
            at = next;
            continue;
        }

        let u = |i: usize| word(dump, params + i);
        let map_points_v = u(8)? as usize;
        let map_points_h = u(9)? as usize;
        let map_planes = u(18)? as usize;
        let n_gains = map_points_v
            .checked_mul(map_points_h)
            .and_then(|n| n.checked_mul(map_planes))
            .ok_or_else(|| Error::OpcodeLayout(format!(
                "GainMap {} grid {}×{}×{} overflows",
                index, map_points_v, map_points_h, map_planes
            )))?;
        let expected = n_gains
            .checked_mul(4)
            .and_then(|n| n.checked_add(GAIN_MAP_FIXED_PARAM_BYTES));
        if expected != Some(param_bytes) {
            return Err(Error::OpcodeLayout(format!(
                "GainMap {} is {}×{}×{} but declares {} parameter bytes",
                index, map_points_v, map_points_h, map_planes, param_bytes
            )));
        }
        let gains_start = at + GAIN_MAP_HEADER_WORDS;
        let gains = dump
            .floats
            .get(gains_start..gains_start + n_gains)
            .ok_or_else(|| Error::OpcodeLayout(format!(
                "GainMap {} needs {} gains but the dump ends after {} values",
                index,
                n_gains,
                dump.floats.len().saturating_sub(gains_start)
            )))?
            .to_vec();
        let double = |i: usize| {
            dump.double_at(params + i)
                .ok_or_else(|| Error::OpcodeLayout(format!("GainMap {} header truncated", index)))
        };

        maps.push(GainMap {
            top: u(0)?,
            left: u(1)?,
            bottom: u(2)?,
            right: u(3)?,
            plane: u(4)?,
            planes: u(5)?,
            row_pitch: u(6)?,
            col_pitch: u(7)?,
            map_points_v,
            map_points_h,
            spacing_v: double(10)?,
            spacing_h: double(12)?,
            origin_v: double(14)?,
            origin_h: double(16)?,
            map_planes,
            gains,
        });
        at = next;
    }

    if at != dump.len() {
        return Err(Error::OpcodeLayout(format!(
            "{} opcodes end at word {} but the dump has {} words",
            count,
            at,
            dump.len()
        )));
    }
    Ok(maps)
}

/// Gain values laid out `(height, width, channels)`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LensShadingMap {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub data: Vec<f32>,
    /// Bayer phase of each channel.
    pub phases: Vec<(usize, usize)>,
}

impl LensShadingMap {
    /// Stacks one channel per GainMap.
    ///
    /// Every map must be single-plane and share the first map's grid size.
    pub fn from_gain_maps(maps: &[GainMap]) -> Result<LensShadingMap> {
        let first = maps
            .first()
            .ok_or_else(|| Error::OpcodeLayout("opcode list holds no GainMap".into()))?;
        let (height, width) = (first.map_points_v, first.map_points_h);

        for (c, m) in maps.iter().enumerate() {
            if m.map_planes != 1 {
                return Err(Error::OpcodeLayout(format!(
                    "GainMap {} has {} planes; only single-plane maps are supported",
                    c, m.map_planes
                )));
            }
            if (m.map_points_v, m.map_points_h) != (height, width) {
                return Err(Error::OpcodeLayout(format!(
                    "GainMap {} is {}×{} but GainMap 0 is {}×{}",
                    c, m.map_points_v, m.map_points_h, height, width
                )));
            }
        }

        let channels = maps.len();
        let mut data = vec![0.0; height * width * channels];
        for (c, m) in maps.iter().enumerate() {
            for (i, &g) in m.gains.iter().enumerate() {
                data[i * channels + c] = g;
            }
        }
        Ok(LensShadingMap {
            height,
            width,
            channels,
            data,
            phases: maps.iter().map(GainMap::phase).collect(),
        })
    }

    /// Parses and assembles in one go.
    pub fn from_dump(dump: &OpcodeDump) -> Result<LensShadingMap> {
        LensShadingMap::from_gain_maps(&parse_gain_maps(dump)?)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize, c: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + c]
    }

    /// Interleaves four channel grids into one `(2h, 2w)` Bayer mosaic,
    /// placing each channel at its phase.
    pub fn to_bayer(&self) -> Result<BayerGrid> {
        let mut seen = [[false; 2]; 2];
        for &(py, px) in &self.phases {
            seen[py][px] = true;
        }
        if self.channels != 4 || seen.iter().flatten().any(|s| !s) {
            return Err(Error::OpcodeLayout(format!(
                "Bayer interleave needs four channels covering all 2×2 phases, got phases {:?}",
                self.phases
            )));
        }

        let (h, w) = (2 * self.height, 2 * self.width);
        let mut data = vec![0.0; h * w];
        for y in 0..self.height {
            for x in 0..self.width {
                for (c, &(py, px)) in self.phases.iter().enumerate() {
                    data[(2 * y + py) * w + 2 * x + px] = self.get(y, x, c);
                }
            }
        }
        Ok(BayerGrid { height: h, width: w, data })
    }

    /// Splits a Bayer mosaic into planes ordered `(0,0), (0,1), (1,0), (1,1)`.
    pub fn from_bayer(grid: &BayerGrid) -> LensShadingMap {
        let (height, width) = (grid.height / 2, grid.width / 2);
        let phases = vec![(0, 0), (0, 1), (1, 0), (1, 1)];
        let mut data = vec![0.0; height * width * 4];
        for y in 0..height {
            for x in 0..width {
                for (c, &(py, px)) in phases.iter().enumerate() {
                    data[(y * width + x) * 4 + c] = grid.data[(2 * y + py) * grid.width + 2 * x + px];
                }
            }
        }
        LensShadingMap { height, width, channels: 4, data, phases }
    }

    /// Channels reordered into canonical Bayer phase order.
    pub fn rectified(&self) -> Result<LensShadingMap> {
        Ok(LensShadingMap::from_bayer(&self.to_bayer()?))
    }

    pub fn max_gain(&self) -> f32 {
        self.data.iter().cloned().fold(0.0, f32::max)
    }
}

/// A single-plane mosaic, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct BayerGrid {
    pub height: usize,
    pub width: usize,
    pub data: Vec<f32>,
}

/// Test support: encodes GainMap opcodes the way they appear in a DNG
/// opcode list. Extraction never calls this.
#[doc(hidden)]
pub fn encode_gain_maps(maps: &[GainMap]) -> Vec<u8> {
    let mut out = (maps.len() as u32).to_be_bytes().to_vec();
    for m in maps {
        let param_bytes = GAIN_MAP_FIXED_PARAM_BYTES + 4 * m.gains.len();
        for w in [GAIN_MAP_ID, 0x0103_0000, 0, param_bytes as u32] {
            out.extend_from_slice(&w.to_be_bytes());
        }
        for w in [
            m.top, m.left, m.bottom, m.right, m.plane, m.planes, m.row_pitch, m.col_pitch,
            m.map_points_v as u32, m.map_points_h as u32,
        ] {
            out.extend_from_slice(&w.to_be_bytes());
        }
        for d in [m.spacing_v, m.spacing_h, m.origin_v, m.origin_h] {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out.extend_from_slice(&(m.map_planes as u32).to_be_bytes());
        for g in &m.gains {
            out.extend_from_slice(&g.to_be_bytes());
        }
    }
    out
}

/// Test support: a single-plane GainMap at the given phase with gains
/// `base + i`.
#[doc(hidden)]
pub fn synthetic_gain_map(top: u32, left: u32, rows: usize, cols: usize, base: f32) -> GainMap {
    GainMap {
        top,
        left,
        bottom: 3000,
        right: 4000,
        plane: 0,
        planes: 1,
        row_pitch: 2,
        col_pitch: 2,
        map_points_v: rows,
        map_points_h: cols,
        spacing_v: 1.0 / (rows as f64 - 1.0).max(1.0),
        spacing_h: 1.0 / (cols as f64 - 1.0).max(1.0),
        origin_v: 0.0,
        origin_h: 0.0,
        map_planes: 1,
        gains: (0..rows * cols).map(|i| base + i as f32).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_channel(rows: usize, cols: usize) -> Vec<GainMap> {
        vec![
            synthetic_gain_map(0, 0, rows, cols, 100.0),
            synthetic_gain_map(0, 1, rows, cols, 200.0),
            synthetic_gain_map(1, 0, rows, cols, 300.0),
            synthetic_gain_map(1, 1, rows, cols, 400.0),
        ]
    }

    #[test]
    fn parses_header_fields_and_gains() {
        let maps = four_channel(3, 5);
        let dump = OpcodeDump::from_bytes(&encode_gain_maps(&maps));
        assert_eq!(dump.len(), 1 + 4 * (GAIN_MAP_HEADER_WORDS + 15));
        // fixed word offsets: count, rows and cols of the first map
        assert_eq!((dump.words[0], dump.words[13], dump.words[14]), (4, 3, 5));
        assert_eq!(parse_gain_maps(&dump).unwrap(), maps);
    }

    #[test]
    fn reshapes_to_height_width_channels() {
        let dump = OpcodeDump::from_bytes(&encode_gain_maps(&four_channel(3, 5)));
        let map = LensShadingMap::from_dump(&dump).unwrap();
        assert_eq!(map.shape(), (3, 5, 4));
        assert_eq!(map.get(0, 0, 0), 100.0);
        assert_eq!(map.get(2, 4, 3), 414.0);
        assert_eq!(map.get(1, 2, 1), 207.0);
        // element [y][x][c] sits at float 1 + c*(23 + h*w) + 23 + y*w + x
        assert_eq!(map.get(1, 2, 1), dump.floats[1 + (23 + 15) + 23 + 5 + 2]);
    }

    #[test]
    fn wrong_token_count_fails_loudly() {
        let mut bytes = encode_gain_maps(&four_channel(2, 2));
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let err = LensShadingMap::from_dump(&OpcodeDump::from_bytes(&bytes)).unwrap_err();
        assert!(matches!(err, Error::OpcodeLayout(_)));

        let bytes = encode_gain_maps(&four_channel(2, 2));
        let truncated = OpcodeDump::from_bytes(&bytes[..bytes.len() - 8]);
        assert!(LensShadingMap::from_dump(&truncated).is_err());
    }

    #[test]
    fn absurd_header_values_are_layout_errors() {
        // opcode count far beyond the data
        let dump = OpcodeDump::from_bytes(&u32::MAX.to_be_bytes());
        assert!(matches!(LensShadingMap::from_dump(&dump), Err(Error::OpcodeLayout(_))));

        // grid dimensions whose product does not fit
        let mut bytes = encode_gain_maps(&[synthetic_gain_map(0, 0, 1, 1, 1.0)]);
        for word in [13usize, 14, 23] {
            bytes[4 * word..4 * word + 4].copy_from_slice(&u32::MAX.to_be_bytes());
        }
        assert!(matches!(
            LensShadingMap::from_dump(&OpcodeDump::from_bytes(&bytes)),
            Err(Error::OpcodeLayout(_))
        ));
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let mut maps = four_channel(2, 2);
        maps[3] = synthetic_gain_map(1, 1, 3, 2, 0.0);
        let dump = OpcodeDump::from_bytes(&encode_gain_maps(&maps));
        assert!(LensShadingMap::from_dump(&dump).is_err());
    }

    #[test]
    fn skips_non_gain_map_opcodes() {
        let maps = four_channel(1, 1);
        let mut bytes = encode_gain_maps(&maps);
        bytes[3] = 5; // five opcodes
        for w in [1u32, 0x0103_0000, 1, 8, 7, 7] {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
        let map = LensShadingMap::from_dump(&OpcodeDump::from_bytes(&bytes)).unwrap();
        assert_eq!(map.channels, 4);
    }

    #[test]
    fn bayer_round_trip_rectifies_channel_order() {
        // channels stored out of phase order
        let maps = vec![
            synthetic_gain_map(1, 1, 2, 2, 400.0),
            synthetic_gain_map(0, 0, 2, 2, 100.0),
            synthetic_gain_map(1, 0, 2, 2, 300.0),
            synthetic_gain_map(0, 1, 2, 2, 200.0),
        ];
        let map = LensShadingMap::from_gain_maps(&maps).unwrap();
        let grid = map.to_bayer().unwrap();
        assert_eq!((grid.height, grid.width), (4, 4));
        assert_eq!(&grid.data[..4], &[100.0, 200.0, 101.0, 201.0]);
        assert_eq!(&grid.data[4..8], &[300.0, 400.0, 301.0, 401.0]);

        let rect = map.rectified().unwrap();
        assert_eq!(rect.phases, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(rect.get(1, 1, 0), 103.0);
        assert_eq!(rect.get(1, 1, 3), 403.0);
    }

    #[test]
    fn bayer_needs_all_four_phases() {
        let maps = vec![
            synthetic_gain_map(0, 0, 1, 1, 1.0),
            synthetic_gain_map(0, 0, 1, 1, 1.0),
            synthetic_gain_map(1, 0, 1, 1, 1.0),
            synthetic_gain_map(1, 1, 1, 1, 1.0),
        ];
        let map = LensShadingMap::from_gain_maps(&maps).unwrap();
        assert!(map.to_bayer().is_err());
    }
}
