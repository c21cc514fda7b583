use std::collections::HashMap;
use std::fmt::Write;

use crate::math::Shape;
use crate::network::network::Network;

/// One line of the layer table.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRow {
    /// Unique, framework-style name: `conv2d`, `conv2d_1`, ...
    pub name: String,
    pub kind: &'static str,
    pub output_shape: Shape,
    pub params: usize,
}

/// Rows for every layer in order, with names numbered per kind.
pub fn layer_rows(network: &Network) -> Vec<LayerRow> {
    let shapes = network.layer_shapes();
    let mut seen: HashMap<&'static str, usize> = HashMap::new();

    network
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let kind = layer.kind();
            let n = seen.entry(kind).or_insert(0);
            let base = kind.to_lowercase();
            let name = if *n == 0 { base } else { format!("{}_{}", base, n) };
            *n += 1;
            LayerRow {
                name,
                kind,
                output_shape: shapes[i + 1],
                params: layer.param_count(),
            }
        })
        .collect()
}

/// Thousands separator for parameter totals.
pub fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Renders the model summary table as text.
pub fn summary(network: &Network) -> String {
    let rule = "_".repeat(65);
    let double = "=".repeat(65);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Model: \"{}\"", network.name);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, " {:<27} {:<25} {}", "Layer (type)", "Output Shape", "Param #");
    let _ = writeln!(out, "{}", double);

    let rows = layer_rows(network);
    for (i, row) in rows.iter().enumerate() {
        let label = format!("{} ({})", row.name, row.kind);
        let _ = writeln!(out, " {:<27} {:<25} {}", label, row.output_shape.to_string(), row.params);
        if i + 1 < rows.len() {
            let _ = writeln!(out);
        }
    }

    let total = network.param_count();
    let _ = writeln!(out, "{}", double);
    let _ = writeln!(out, "Total params: {}", group_digits(total));
    let _ = writeln!(out, "Trainable params: {}", group_digits(total));
    let _ = writeln!(out, "Non-trainable params: 0");
    let _ = write!(out, "{}", rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Architecture;

    #[test]
    fn names_are_numbered_per_kind() {
        let rows = layer_rows(&Architecture::Tf2.spec().build(0));
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(&names[..4], &["conv2d", "conv2d_1", "maxpooling2d", "conv2d_2"]);
        assert_eq!(rows.last().map(|r| r.name.as_str()), Some("dense_1"));
    }

    #[test]
    fn summary_reports_grouped_total() {
        let text = summary(&Architecture::Tf1.spec().build(0));
        assert!(text.contains("Model: \"tf1\""));
        assert!(text.contains("(None, 14, 14, 32)"));
        assert!(text.contains("Total params: 63,050"));
    }

    #[test]
    fn group_digits_inserts_commas() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(2_346_018), "2,346,018");
    }
}
