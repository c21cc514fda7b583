//! Camera color matrix conversion.
//!
//! Raw files carry an XYZ → camera matrix. The calibration text holds the
//! camera → linear sRGB matrix instead, derived the same way dcraw and
//! LibRaw derive `rgb_cam`: project onto sRGB primaries, normalise each
//! row so a neutral camera response maps to white, then invert.

/// Linear sRGB (D65) → XYZ.
pub const XYZ_RGB: [[f64; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

const EPS: f64 = 1e-12;

pub(crate) type Mat3 = [[f64; 3]; 3];

fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Inverse by cofactors; `None` when singular.
pub(crate) fn invert(m: &Mat3) -> Option<Mat3> {
    let c = |r0: usize, r1: usize, c0: usize, c1: usize| m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0];
    let cof = [
        [c(1, 2, 1, 2), -c(1, 2, 0, 2), c(1, 2, 0, 1)],
        [-c(0, 2, 1, 2), c(0, 2, 0, 2), -c(0, 2, 0, 1)],
        [c(0, 1, 1, 2), -c(0, 1, 0, 2), c(0, 1, 0, 1)],
    ];
    let det: f64 = (0..3).map(|j| m[0][j] * cof[0][j]).sum();
    if !det.is_finite() || det.abs() < EPS {
        return None;
    }
    let mut inv = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            inv[i][j] = cof[j][i] / det;
        }
    }
    Some(inv)
}

/// Camera → sRGB primaries with each row scaled to sum to one.
pub(crate) fn normalized_cam_rgb(xyz_to_cam: &[[f32; 3]; 3]) -> Option<Mat3> {
    let cam_xyz = xyz_to_cam.map(|row| row.map(f64::from));
    let mut cam_rgb = mul(&cam_xyz, &XYZ_RGB);
    for row in cam_rgb.iter_mut() {
        let sum: f64 = row.iter().sum();
        if !sum.is_finite() || sum.abs() < EPS {
            return None;
        }
        row.iter_mut().for_each(|v| *v /= sum);
    }
    Some(cam_rgb)
}

/// The camera → linear sRGB matrix for a given XYZ → camera matrix. Rows
/// of the result sum to one. `None` when the input is degenerate.
pub fn camera_to_srgb(xyz_to_cam: &[[f32; 3]; 3]) -> Option<[[f32; 3]; 3]> {
    let inv = invert(&normalized_cam_rgb(xyz_to_cam)?)?;
    Some(inv.map(|row| row.map(|v| v as f32)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Canon EOS 5D Mark III D65 ColorMatrix, as stored in its DNGs.
    const EOS_5D3: [[f32; 3]; 3] = [
        [0.6722, -0.0635, -0.0963],
        [-0.4287, 1.2460, 0.2028],
        [-0.0908, 0.2162, 0.5668],
    ];

    fn srgb_camera() -> [[f32; 3]; 3] {
        invert(&XYZ_RGB).unwrap().map(|row| row.map(|v| v as f32))
    }

    #[test]
    fn srgb_camera_maps_to_identity() {
        let rgb_cam = camera_to_srgb(&srgb_camera()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(rgb_cam[i][j], if i == j { 1.0 } else { 0.0 }, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn rows_sum_to_one_and_undo_the_camera_matrix() {
        let rgb_cam = camera_to_srgb(&EOS_5D3).unwrap();
        for row in &rgb_cam {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        }
        // dominant diagonal, as for any real sensor
        assert!(rgb_cam[0][0] > 1.0 && rgb_cam[1][1] > 1.0 && rgb_cam[2][2] > 1.0);

        let cam_rgb = normalized_cam_rgb(&EOS_5D3).unwrap();
        let rgb_cam = rgb_cam.map(|row| row.map(f64::from));
        let product = mul(&rgb_cam, &cam_rgb);
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(product[i][j], if i == j { 1.0 } else { 0.0 }, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn row_scale_of_the_input_does_not_matter() {
        let mut scaled = EOS_5D3;
        scaled[1].iter_mut().for_each(|v| *v *= 2.5);
        let a = camera_to_srgb(&EOS_5D3).unwrap();
        let b = camera_to_srgb(&scaled).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(a[i][j], b[i][j], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn degenerate_matrices_are_rejected() {
        let mut zero_row = EOS_5D3;
        zero_row[2] = [0.0; 3];
        assert!(camera_to_srgb(&zero_row).is_none());

        let mut repeated = EOS_5D3;
        repeated[2] = repeated[0];
        assert!(camera_to_srgb(&repeated).is_none());
    }
}
