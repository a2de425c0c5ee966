//! CART decision tree (Gini impurity)

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Classification tree over class indices `0..n_classes`.
///
/// Nodes live in a flat arena; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<DecisionNode>,
    max_depth: Option<usize>,
    min_samples_split: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    pub fn new(max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            nodes: Vec::new(),
            max_depth,
            min_samples_split: min_samples_split.max(2),
        }
    }

    /// Grow the tree on the rows listed in `sample` (duplicates allowed).
    ///
    /// At each node `max_features` candidate features are drawn; more are
    /// visited when the drawn ones are constant on the node.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        rows: &[Vec<f64>],
        classes: &[usize],
        n_classes: usize,
        sample: Vec<usize>,
        max_features: usize,
        rng: &mut R,
    ) {
        self.nodes.clear();
        if sample.is_empty() || rows.is_empty() {
            self.nodes.push(DecisionNode::Leaf { class: 0 });
            return;
        }

        let n_features = rows[0].len();
        let max_features = max_features.clamp(1, n_features.max(1));
        let mut feature_order: Vec<usize> = (0..n_features).collect();

        self.nodes.push(DecisionNode::Leaf { class: 0 });
        let mut pending = vec![(0usize, sample, 0usize)];

        while let Some((node_idx, indices, depth)) = pending.pop() {
            let counts = class_counts(classes, &indices, n_classes);
            let majority = majority_class(&counts);
            self.nodes[node_idx] = DecisionNode::Leaf { class: majority };

            let node_impurity = gini(&counts, indices.len());
            let depth_reached = self.max_depth.map_or(false, |max| depth >= max);
            if depth_reached || indices.len() < self.min_samples_split || node_impurity <= 0.0 {
                continue;
            }

            feature_order.shuffle(rng);
            let Some(split) = best_split(rows, classes, n_classes, &indices, &feature_order, max_features)
            else {
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| rows[i][split.feature] <= split.threshold);

            let left_idx = self.nodes.len();
            self.nodes.push(DecisionNode::Leaf { class: majority });
            let right_idx = self.nodes.len();
            self.nodes.push(DecisionNode::Leaf { class: majority });

            self.nodes[node_idx] = DecisionNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: left_idx,
                right: right_idx,
            };

            tracing::trace!(
                "node {} split on feature {} at {} (impurity {:.4})",
                node_idx, split.feature, split.threshold, split.impurity
            );

            pending.push((left_idx, left, depth + 1));
            pending.push((right_idx, right, depth + 1));
        }
    }

    /// Class index predicted for one row
    pub fn predict(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(DecisionNode::Leaf { class }) => return *class,
                Some(DecisionNode::Split { feature, threshold, left, right }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0,
            }
        }
    }

    /// Structural check for trees read back from disk: every child sits
    /// later in the arena than its parent, and split features and leaf
    /// classes are in range.
    pub fn check(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                DecisionNode::Leaf { class } => {
                    if class >= n_classes {
                        return Err(format!("node {}: class {} out of {} classes", idx, class, n_classes));
                    }
                }
                DecisionNode::Split { feature, left, right, .. } => {
                    if feature >= n_features {
                        return Err(format!("node {}: feature {} out of {} features", idx, feature, n_features));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {}: child {} is not a later node", idx, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[DecisionNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(DecisionNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

fn class_counts(classes: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in indices {
        counts[classes[i]] += 1;
    }
    counts
}

/// Most frequent class; ties go to the lowest index
fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn best_split(
    rows: &[Vec<f64>],
    classes: &[usize],
    n_classes: usize,
    indices: &[usize],
    feature_order: &[usize],
    max_features: usize,
) -> Option<Split> {
    let n = indices.len();
    let mut best: Option<Split> = None;
    let mut visited = 0;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

    for &feature in feature_order {
        if visited >= max_features {
            break;
        }

        sorted.clear();
        sorted.extend(indices.iter().map(|&i| (rows[i][feature], classes[i])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        if sorted[0].0 == sorted[n - 1].0 {
            continue;
        }
        visited += 1;

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = vec![0usize; n_classes];
        for &(_, class) in sorted.iter() {
            right_counts[class] += 1;
        }

        for pos in 0..n - 1 {
            let (value, class) = sorted[pos];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let next_value = sorted[pos + 1].0;
            if value == next_value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(&left_counts, n_left)
                + n_right as f64 * gini(&right_counts, n_right))
                / n as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next_value - value) / 2.0;
                // Midpoint may round up to the next value
                if threshold >= next_value {
                    threshold = value;
                }
                best = Some(Split { feature, threshold, impurity });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_learns_xor() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ];
        let classes = vec![0, 1, 1, 0];
        let mut rng = StdRng::seed_from_u64(7);

        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&rows, &classes, 2, (0..4).collect(), 2, &mut rng);

        for (row, &class) in rows.iter().zip(&classes) {
            assert_eq!(tree.predict(row), class);
        }
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_depth_limit_yields_majority_leaf() {
        let rows = vec![vec![0.0], vec![1.0], vec![2.0]];
        let classes = vec![1, 1, 0];
        let mut rng = StdRng::seed_from_u64(1);

        let mut tree = DecisionTree::new(Some(0), 2);
        tree.fit(&rows, &classes, 2, (0..3).collect(), 1, &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[2.0]), 1);
    }

    #[test]
    fn test_constant_features_stop_splitting() {
        let rows = vec![vec![5.0, 5.0]; 4];
        let classes = vec![0, 1, 1, 1];
        let mut rng = StdRng::seed_from_u64(3);

        let mut tree = DecisionTree::new(None, 2);
        tree.fit(&rows, &classes, 2, (0..4).collect(), 1, &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&[5.0, 5.0]), 1);
    }

    #[test]
    fn test_check_rejects_malformed_arena() {
        let tree = |nodes: Vec<DecisionNode>| DecisionTree { nodes, max_depth: None, min_samples_split: 2 };
        let split = |left, right| DecisionNode::Split { feature: 0, threshold: 0.5, left, right };
        let leaf = |class| DecisionNode::Leaf { class };

        assert!(tree(vec![split(1, 2), leaf(0), leaf(1)]).check(1, 2).is_ok());
        assert!(tree(Vec::new()).check(1, 2).is_err());
        // Cycle back to the root
        assert!(tree(vec![split(0, 1), leaf(0)]).check(1, 2).is_err());
        assert!(tree(vec![split(1, 5), leaf(0)]).check(1, 2).is_err());
        assert!(tree(vec![leaf(2)]).check(1, 2).is_err());
        assert!(tree(vec![split(1, 2), leaf(0), leaf(1)]).check(0, 2).is_err());
    }

    #[test]
    fn test_majority_tie_breaks_low() {
        assert_eq!(majority_class(&[2, 2]), 0);
        assert_eq!(majority_class(&[1, 3, 3]), 1);
    }
}
