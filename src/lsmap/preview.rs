use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::Result;
use crate::lsmap::gain_map::LensShadingMap;

/// Pixels per map point in the preview.
const ZOOM: u32 = 8;
const GUTTER: u32 = 4;

/// One grayscale tile per channel side by side, brightness proportional to
/// gain relative to the largest gain in the map.
pub fn render_preview(map: &LensShadingMap) -> GrayImage {
    let tile_w = map.width as u32 * ZOOM;
    let tile_h = map.height as u32 * ZOOM;
    let channels = map.channels as u32;
    let width = (tile_w * channels + GUTTER * channels.saturating_sub(1)).max(1);
    let mut img = GrayImage::from_pixel(width, tile_h.max(1), Luma([0]));

    let max = map.max_gain();
    let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
    for c in 0..map.channels {
        let x0 = c as u32 * (tile_w + GUTTER);
        for y in 0..map.height {
            for x in 0..map.width {
                let v = (map.get(y, x, c) * scale).round().clamp(0.0, 255.0) as u8;
                for dy in 0..ZOOM {
                    for dx in 0..ZOOM {
                        img.put_pixel(x0 + x as u32 * ZOOM + dx, y as u32 * ZOOM + dy, Luma([v]));
                    }
                }
            }
        }
    }
    img
}

pub fn save_preview(map: &LensShadingMap, path: &Path) -> Result<()> {
    render_preview(map).save(path)?;
    log::info!("wrote preview {}", path.display());
    Ok(())
}
