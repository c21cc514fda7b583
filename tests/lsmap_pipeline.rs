use std::path::Path;

use ferrite_lab::lsmap::gain_map::{encode_gain_maps, synthetic_gain_map};
use ferrite_lab::lsmap::{extract_to_dir, read_mat, ExtractOptions, OpcodeDump, OpcodeSource, LSMAP_FIELD};
use ferrite_lab::{Error, LensShadingMap, Result};

/// Formats bytes the way `od --format=u4` and `od -f` print them, eight
/// values per line.
fn od_text(bytes: &[u8]) -> (String, String) {
    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let mut header = String::new();
    let mut payload = String::new();
    for (i, w) in words.iter().enumerate() {
        header.push_str(&format!(" {:>10}", w));
        payload.push_str(&format!(" {:>15e}", f32::from_bits(*w)));
        if i % 8 == 7 {
            header.push('\n');
            payload.push('\n');
        }
    }
    (header, payload)
}

fn rggb(rows: usize, cols: usize) -> Vec<u8> {
    let maps: Vec<_> = [(0, 0), (0, 1), (1, 0), (1, 1)]
        .iter()
        .enumerate()
        .map(|(c, &(t, l))| synthetic_gain_map(t, l, rows, cols, 1.0 + c as f32))
        .collect();
    encode_gain_maps(&maps)
}

#[test]
fn text_dump_gives_expected_shape_and_leading_element() {
    let (header, payload) = od_text(&rggb(13, 17));
    let dump = OpcodeDump::parse(&header, &payload).unwrap();
    assert_eq!(dump.len(), 1 + 4 * (23 + 13 * 17));

    let map = LensShadingMap::from_dump(&dump).unwrap();
    assert_eq!(map.shape(), (13, 17, 4));
    assert_eq!(map.get(0, 0, 0), 1.0);
    assert_eq!(map.get(0, 0, 0), dump.floats[24]);
    assert_eq!(map.get(12, 16, 3), 4.0 + (13 * 17 - 1) as f32);
}

#[test]
fn truncated_text_dump_fails_with_layout_error() {
    let (header, payload) = od_text(&rggb(4, 4));
    let header: Vec<&str> = header.split_whitespace().collect();
    let payload: Vec<&str> = payload.split_whitespace().collect();
    let n = header.len() - 3;
    let dump = OpcodeDump::parse(&header[..n].join(" "), &payload[..n].join(" ")).unwrap();
    assert!(matches!(LensShadingMap::from_dump(&dump), Err(Error::OpcodeLayout(_))));
}

struct InMemory(Vec<u8>);

impl OpcodeSource for InMemory {
    fn opcode_dump(&self, _: &Path) -> Result<OpcodeDump> {
        Ok(OpcodeDump::from_bytes(&self.0))
    }
}

#[test]
fn extraction_writes_a_mat_file_per_input() {
    let dir = tempfile::tempdir().unwrap();
    let source = InMemory(rggb(3, 4));
    for name in ["IMG_0001.dng", "IMG_0002.dng"] {
        let mat = extract_to_dir(&source, Path::new(name), Some(dir.path()), &ExtractOptions::default())
            .unwrap();
        let arr = read_mat(&mat).unwrap();
        assert_eq!(arr.name, LSMAP_FIELD);
        assert_eq!(arr.dims, vec![3, 4, 4]);
        assert_eq!(arr.get3(2, 3, 1), 2.0 + 11.0);
    }
    assert!(dir.path().join("IMG_0002.mat").exists());
}
