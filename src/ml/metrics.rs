//! Classification metrics

use std::collections::BTreeSet;

/// Macro-averaged F1 score.
///
/// Classes are the union of labels in both sequences. A class whose
/// precision and recall are both undefined scores 0.
pub fn f1_macro(y_true: &[i64], y_pred: &[i64]) -> f64 {
    let classes: BTreeSet<i64> = y_true.iter().chain(y_pred).copied().collect();
    if classes.is_empty() {
        return 0.0;
    }

    let total: f64 = classes
        .iter()
        .map(|&class| {
            let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
            for (&truth, &pred) in y_true.iter().zip(y_pred) {
                match (truth == class, pred == class) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }

            let denominator = 2 * tp + fp + fn_;
            if denominator == 0 {
                0.0
            } else {
                (2 * tp) as f64 / denominator as f64
            }
        })
        .sum();

    total / classes.len() as f64
}
