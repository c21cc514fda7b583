//! PNG rendering of a network as a vertical stack of labelled boxes.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::network::summary::{group_digits, layer_rows};

const FONT_PX: u32 = 16;
/// Rough advance of sans-serif at `FONT_PX`; boxes are sized from it.
const CHAR_W: u32 = 10;
const LINE_H: u32 = 22;
const PAD: u32 = 10;
const GAP: u32 = 28;
const MARGIN: u32 = 16;

const BOX_FILL: RGBColor = RGBColor(232, 240, 252);
const INPUT_FILL: RGBColor = RGBColor(236, 236, 236);

/// Box contents: one entry per box, each a list of text lines.
fn box_lines(network: &Network) -> Vec<Vec<String>> {
    let mut boxes = vec![vec![
        "input".to_string(),
        format!("{}", network.input_shape),
    ]];
    for row in layer_rows(network) {
        boxes.push(vec![
            format!("{}: {}", row.name, row.kind),
            format!("{}", row.output_shape),
            format!("params {}", group_digits(row.params)),
        ]);
    }
    boxes
}

fn plot_err(e: impl std::fmt::Display) -> Error {
    Error::Plot(e.to_string())
}

/// Renders the diagram and writes it as PNG.
pub fn render_diagram(network: &Network, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let boxes = box_lines(network);
    let box_w = boxes
        .iter()
        .flat_map(|lines| lines.iter().map(|l| l.chars().count() as u32))
        .max()
        .unwrap_or(0)
        * CHAR_W
        + 2 * PAD;
    let heights: Vec<u32> = boxes
        .iter()
        .map(|lines| lines.len() as u32 * LINE_H + 2 * PAD)
        .collect();
    let width = box_w + 2 * MARGIN;
    let height = heights.iter().sum::<u32>() + GAP * (boxes.len() as u32 - 1) + 2 * MARGIN;

    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let (left, right) = (MARGIN as i32, (MARGIN + box_w) as i32);
    let center = (MARGIN + box_w / 2) as i32;
    let font = ("sans-serif", FONT_PX).into_font();
    let mut y = MARGIN as i32;
    for (i, (lines, &h)) in boxes.iter().zip(&heights).enumerate() {
        if i > 0 {
            let top = y - GAP as i32;
            root.draw(&PathElement::new(vec![(center, top), (center, y - 1)], BLACK.stroke_width(1)))
                .map_err(plot_err)?;
            root.draw(&PathElement::new(
                vec![(center - 4, y - 6), (center, y - 1), (center + 4, y - 6)],
                BLACK.stroke_width(1),
            ))
            .map_err(plot_err)?;
        }
        let fill = if i == 0 { INPUT_FILL } else { BOX_FILL };
        let corners = [(left, y), (right, y + h as i32)];
        root.draw(&Rectangle::new(corners, fill.filled())).map_err(plot_err)?;
        root.draw(&Rectangle::new(corners, BLACK.stroke_width(1))).map_err(plot_err)?;
        for (j, line) in lines.iter().enumerate() {
            let at = (left + PAD as i32, y + (PAD + j as u32 * LINE_H) as i32);
            root.draw(&Text::new(line.as_str(), at, font.clone()))
                .map_err(plot_err)?;
        }
        y += (h + GAP) as i32;
    }

    root.present().map_err(plot_err)?;
    log::info!("wrote network diagram to {}", path.display());
    Ok(())
}
