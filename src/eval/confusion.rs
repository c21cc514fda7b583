use std::fmt;

/// Counts of `(true class, predicted class)` pairs; rows are true classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// # Panics
    /// Panics if the slices differ in length or a class is out of range.
    pub fn from_predictions(truth: &[usize], predicted: &[usize], n_classes: usize) -> ConfusionMatrix {
        assert_eq!(truth.len(), predicted.len(), "truth and predictions differ in length");
        let mut counts = vec![vec![0; n_classes]; n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[t][p] += 1;
        }
        ConfusionMatrix { n_classes, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Diagonal over total.
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let hits: usize = (0..self.n_classes).map(|i| self.counts[i][i]).sum();
        hits as f32 / total as f32
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Bracketed integer grid with right-aligned columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        for (i, row) in self.counts.iter().enumerate() {
            let open = if i == 0 { "[[" } else { " [" };
            let cells: Vec<String> = row.iter().map(|c| format!("{:>w$}", c, w = width)).collect();
            let close = if i + 1 == self.counts.len() { "]]" } else { "]\n" };
            write!(f, "{}{}{}", open, cells.join(" "), close)?;
        }
        Ok(())
    }
}
