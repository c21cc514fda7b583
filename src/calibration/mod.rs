//! White-balance and color-matrix extraction from camera raw files.

pub mod color;
pub mod raw;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IoContext, Result};

pub use raw::RawDecoder;

/// The calibration vectors read from one raw file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraCalibration {
    /// As-shot multipliers for R, G, B.
    pub white_balance: [f32; 3],
    /// Camera to linear sRGB matrix, row-major; rows sum to one.
    pub color_matrix: [[f32; 3]; 3],
}

pub trait CalibrationSource {
    fn calibration(&self, path: &Path) -> Result<CameraCalibration>;
}

fn write_line<W: Write>(w: &mut W, values: &[f32]) -> std::io::Result<()> {
    let line: Vec<String> = values.iter().map(|v| format!("{:.12}", v)).collect();
    writeln!(w, "{}", line.join(" "))
}

/// White balance on the first line, the flattened color matrix on the second.
pub fn write_calibration<W: Write>(w: &mut W, cal: &CameraCalibration) -> std::io::Result<()> {
    write_line(w, &cal.white_balance)?;
    let flat: Vec<f32> = cal.color_matrix.iter().flatten().copied().collect();
    write_line(w, &flat)
}

pub fn extract_to_file(source: &dyn CalibrationSource, raw: &Path, txt: &Path) -> Result<CameraCalibration> {
    let cal = source.calibration(raw)?;
    if let Some(parent) = txt.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).at_path(parent)?;
    }
    let mut w = BufWriter::new(File::create(txt).at_path(txt)?);
    write_calibration(&mut w, &cal).at_path(txt)?;
    w.flush().at_path(txt)?;
    log::info!("wrote {}", txt.display());
    Ok(cal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct Fixed(CameraCalibration);

    impl CalibrationSource for Fixed {
        fn calibration(&self, _: &Path) -> Result<CameraCalibration> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl CalibrationSource for Broken {
        fn calibration(&self, path: &Path) -> Result<CameraCalibration> {
            Err(Error::RawDecode { path: path.to_path_buf(), message: "unsupported".into() })
        }
    }

    fn sample() -> CameraCalibration {
        CameraCalibration {
            white_balance: [2.0, 1.0, 1.5],
            color_matrix: [[0.5, -0.25, 0.0], [-0.125, 1.0, 0.0625], [0.0, 0.25, 0.75]],
        }
    }

    #[test]
    fn two_lines_of_twelve_decimal_values() {
        let mut out = Vec::new();
        write_calibration(&mut out, &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "2.000000000000 1.000000000000 1.500000000000");

        let second: Vec<&str> = lines[1].split(' ').collect();
        assert_eq!(second.len(), 9);
        assert_eq!(second[1], "-0.250000000000");
        for tok in second {
            assert_eq!(tok.split('.').nth(1).map(str::len), Some(12));
        }
    }

    #[test]
    fn extract_writes_the_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("meta").join("IMG_1.txt");
        extract_to_file(&Fixed(sample()), Path::new("IMG_1.dng"), &txt).unwrap();
        let text = fs::read_to_string(&txt).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn decode_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("IMG_2.txt");
        assert!(extract_to_file(&Broken, Path::new("IMG_2.dng"), &txt).is_err());
        assert!(!txt.exists());
    }
}
