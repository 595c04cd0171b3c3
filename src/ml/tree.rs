//! Binary classification tree grown with Gini impurity.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::N_CLASSES;
use crate::models::{FeatureArray, Label, FEATURE_COUNT};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may split
    pub min_samples_split: usize,
    /// Features examined per split before settling for the best found so far
    pub max_features: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: FEATURE_COUNT,
        }
    }
}

/// Tree node. Leaves keep raw class counts so probabilities are recomputed
/// identically after a save/load cycle. Children are indices into the node
/// arena and always point past their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        counts: [u32; N_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Decision tree stored as a flat node arena rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

/// Borrowed training data shared by every recursive call
struct GrowContext<'a> {
    samples: &'a [FeatureArray],
    labels: &'a [Label],
    params: TreeParams,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on `indices` (which may repeat, as in a bootstrap sample).
    ///
    /// Callers guarantee `samples.len() == labels.len()` and that every index
    /// is in bounds.
    pub fn fit(
        samples: &[FeatureArray],
        labels: &[Label],
        indices: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let ctx = GrowContext {
            samples,
            labels,
            params,
        };
        let mut nodes = Vec::new();
        grow(&ctx, &mut nodes, indices.to_vec(), 0, rng);
        Self { nodes }
    }

    /// Class probabilities for one sample
    pub fn predict_proba(&self, sample: &FeatureArray) -> [f64; N_CLASSES] {
        let mut id = 0;
        while let Some(node) = self.nodes.get(id) {
            match node {
                TreeNode::Leaf { counts } => return leaf_probabilities(counts),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                },
            }
        }
        // Unreachable for trees that pass `is_well_formed`
        [0.5, 0.5]
    }

    /// Structural check for trees read back from disk
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(id, node)| match node {
                TreeNode::Leaf { .. } => true,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < FEATURE_COUNT
                        && !threshold.is_nan()
                        && *left > id
                        && *right > id
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                },
            })
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, id: usize) -> usize {
        match self.nodes.get(id) {
            Some(TreeNode::Split { left, right, .. }) => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            },
            _ => 0,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }
}

/// Append the subtree for `indices` to `nodes` and return its root index
fn grow(
    ctx: &GrowContext<'_>,
    nodes: &mut Vec<TreeNode>,
    indices: Vec<usize>,
    depth: usize,
    rng: &mut StdRng,
) -> usize {
    let id = nodes.len();
    let counts = class_counts(ctx.labels, &indices);
    nodes.push(TreeNode::Leaf { counts });

    let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
    let depth_reached = ctx.params.max_depth.is_some_and(|max| depth >= max);
    if is_pure || depth_reached || indices.len() < ctx.params.min_samples_split.max(2) {
        return id;
    }

    let Some(split) = find_best_split(ctx, &indices, rng) else {
        return id;
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| ctx.samples[i][split.feature] <= split.threshold);

    let left = grow(ctx, nodes, left, depth + 1, rng);
    let right = grow(ctx, nodes, right, depth + 1, rng);
    nodes[id] = TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };
    id
}

/// Examine features in random order. After `max_features` candidates the
/// search stops as soon as some valid split has been found; constant features
/// never count as a valid split.
fn find_best_split(
    ctx: &GrowContext<'_>,
    indices: &[usize],
    rng: &mut StdRng,
) -> Option<BestSplit> {
    let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
    features.shuffle(rng);

    let mut best: Option<BestSplit> = None;
    for (visited, &feature) in features.iter().enumerate() {
        if visited >= ctx.params.max_features && best.is_some() {
            break;
        }

        if let Some(candidate) = best_split_on_feature(ctx, indices, feature) {
            if best
                .as_ref()
                .map_or(true, |current| candidate.impurity < current.impurity)
            {
                best = Some(candidate);
            }
        }
    }

    best
}

/// Sweep the sorted values of one feature and return the threshold with the
/// lowest weighted Gini impurity
fn best_split_on_feature(
    ctx: &GrowContext<'_>,
    indices: &[usize],
    feature: usize,
) -> Option<BestSplit> {
    let mut values: Vec<(f64, Label)> = indices
        .iter()
        .map(|&i| (ctx.samples[i][feature], ctx.labels[i]))
        .collect();
    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total = class_counts_of(values.iter().map(|(_, label)| *label));
    let n = values.len() as f64;
    let mut left = [0u32; N_CLASSES];
    let mut best: Option<BestSplit> = None;

    for i in 1..values.len() {
        left[values[i - 1].1.index()] += 1;

        let (lower, upper) = (values[i - 1].0, values[i].0);
        if lower >= upper {
            continue;
        }

        let right = [total[0] - left[0], total[1] - left[1]];
        let n_left = i as f64;
        let n_right = n - n_left;
        let impurity = (n_left * gini(&left) + n_right * gini(&right)) / n;

        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            let mut threshold = lower + (upper - lower) / 2.0;
            // Adjacent floats can round the midpoint up onto the upper value
            if threshold >= upper {
                threshold = lower;
            }
            best = Some(BestSplit {
                feature,
                threshold,
                impurity,
            });
        }
    }

    best
}

fn gini(counts: &[u32; N_CLASSES]) -> f64 {
    let total: u32 = counts.iter().sum();
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

fn class_counts(labels: &[Label], indices: &[usize]) -> [u32; N_CLASSES] {
    class_counts_of(indices.iter().map(|&i| labels[i]))
}

fn class_counts_of(labels: impl Iterator<Item = Label>) -> [u32; N_CLASSES] {
    let mut counts = [0u32; N_CLASSES];
    for label in labels {
        counts[label.index()] += 1;
    }
    counts
}

fn leaf_probabilities(counts: &[u32; N_CLASSES]) -> [f64; N_CLASSES] {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return [0.5, 0.5];
    }
    let total = total as f64;
    [counts[0] as f64 / total, counts[1] as f64 / total]
}
