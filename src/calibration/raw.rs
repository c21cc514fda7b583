use std::path::Path;

use crate::calibration::color::camera_to_srgb;
use crate::calibration::{CalibrationSource, CameraCalibration};
use crate::error::{Error, Result};

/// Reads calibration data with the `rawloader` decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl CalibrationSource for RawDecoder {
    fn calibration(&self, path: &Path) -> Result<CameraCalibration> {
        let image = rawloader::decode_file(path).map_err(|e| Error::RawDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!(
            "{}: {} {} ({}×{})",
            path.display(),
            image.clean_make,
            image.clean_model,
            image.width,
            image.height
        );

        let wb = image.wb_coeffs;
        if wb[..3].iter().any(|v| !v.is_finite()) {
            return Err(Error::RawDecode {
                path: path.to_path_buf(),
                message: "file carries no white balance".into(),
            });
        }
        let xyz_to_cam = [image.xyz_to_cam[0], image.xyz_to_cam[1], image.xyz_to_cam[2]];
        let color_matrix = camera_to_srgb(&xyz_to_cam).ok_or_else(|| Error::RawDecode {
            path: path.to_path_buf(),
            message: format!("degenerate color matrix {:?}", xyz_to_cam),
        })?;
        Ok(CameraCalibration { white_balance: [wb[0], wb[1], wb[2]], color_matrix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_raw.dng");
        std::fs::write(&path, b"definitely not a raw file").unwrap();
        assert!(matches!(
            RawDecoder.calibration(&path),
            Err(Error::RawDecode { .. })
        ));
    }
}
