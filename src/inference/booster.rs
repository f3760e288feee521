//! Gradient-boosted trees from an XGBoost JSON model
//!
//! Reads the document written by `Booster.save_model("model.json")` and
//! evaluates it without the native library. Only the `gbtree` booster with
//! a single output group and numerical splits is supported.
//!
//! Routing matches XGBoost: go left when `x < split_condition` (compared in
//! f32), missing (NaN) values follow `default_left`, and a leaf stores its
//! value in `split_conditions`.

use ndarray::Array1;
use serde::Deserialize;

use super::error::ModelError;
use super::regressor::{Link, ModelDescription, Regressor};

// ============================================================================
// DOCUMENT FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct XgbDocument {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveParam,
    gradient_booster: GradientBooster,
}

/// XGBoost writes these scalars as strings
#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_target: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveParam {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<TreeEnsemble>,
}

#[derive(Debug, Deserialize)]
struct TreeEnsemble {
    trees: Vec<RawTree>,
    #[serde(default)]
    tree_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<i64>,
}

/// `default_left` is 0/1 in some releases and true/false in others
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ============================================================================
// TREES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree; every child index must point past its parent
    pub fn new(nodes: Vec<Node>) -> Result<Self, ModelError> {
        if nodes.is_empty() {
            return Err(ModelError::Invalid("tree has no nodes".to_string()));
        }
        for (i, node) in nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = *node {
                for child in [left, right] {
                    if child <= i || child >= nodes.len() {
                        return Err(ModelError::Invalid(format!(
                            "node {} has out-of-order child {}",
                            i, child
                        )));
                    }
                }
            }
        }
        Ok(Self { nodes })
    }

    fn from_raw(raw: RawTree, index: usize) -> Result<Self, ModelError> {
        let n = raw.left_children.len();
        let lengths = [
            raw.right_children.len(),
            raw.split_indices.len(),
            raw.split_conditions.len(),
            raw.default_left.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(ModelError::Invalid(format!("tree {} has ragged node arrays", index)));
        }
        if raw.split_type.iter().any(|&t| t != 0) {
            return Err(ModelError::Unsupported(format!("categorical split in tree {}", index)));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = raw.left_children[i];
            if left == -1 {
                nodes.push(Node::Leaf(raw.split_conditions[i]));
                continue;
            }

            let right = raw.right_children[i];
            let feature = raw.split_indices[i];
            if left < 0 || right < 0 || feature < 0 {
                return Err(ModelError::Invalid(format!("tree {} node {} has negative index", index, i)));
            }
            nodes.push(Node::Split {
                feature: feature as usize,
                threshold: raw.split_conditions[i] as f32,
                left: left as usize,
                right: right as usize,
                default_left: raw.default_left[i].is_set(),
            });
        }

        Tree::new(nodes)
    }

    /// Highest feature index any split reads
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match *node {
                Node::Split { feature, .. } => Some(feature),
                Node::Leaf(_) => None,
            })
            .max()
    }

    pub fn leaf_value(&self, row: &Array1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split { feature, threshold, left, right, default_left } => {
                    let x = row.get(feature).copied().unwrap_or(f64::NAN);
                    idx = if x.is_nan() {
                        if default_left { left } else { right }
                    } else if (x as f32) < threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Clone)]
pub struct XgbModel {
    trees: Vec<Tree>,
    base_margin: f64,
    link: Link,
    objective: String,
    num_feature: Option<usize>,
    feature_names: Option<Vec<String>>,
}

impl XgbModel {
    pub fn new(trees: Vec<Tree>, base_score: f64, link: Link, num_feature: Option<usize>) -> Self {
        let objective = match link {
            Link::Identity => "reg:squarederror",
            Link::Logistic => "reg:logistic",
        };
        Self {
            trees,
            base_margin: link.inverse(base_score),
            link,
            objective: objective.to_string(),
            num_feature,
            feature_names: None,
        }
    }

    pub fn from_document(doc: XgbDocument) -> Result<Self, ModelError> {
        let learner = doc.learner;
        let params = &learner.learner_model_param;

        for (name, value) in [("num_class", &params.num_class), ("num_target", &params.num_target)] {
            let groups = parse_count(value.as_deref(), name)?.unwrap_or(0);
            if groups > 1 {
                return Err(ModelError::Unsupported(format!("{} = {}", name, groups)));
            }
        }

        let link = objective_link(&learner.objective.name)?;
        let base_score = parse_base_score(&params.base_score)?;
        let num_feature = parse_count(params.num_feature.as_deref(), "num_feature")?.filter(|&n| n > 0);

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster `{}`",
                learner.gradient_booster.name
            )));
        }
        let ensemble = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::Invalid("gbtree has no model".to_string()))?;

        if ensemble.tree_info.iter().any(|&group| group != 0) {
            return Err(ModelError::Unsupported("multiple output groups".to_string()));
        }

        let trees = ensemble
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(raw, i))
            .collect::<Result<Vec<_>, _>>()?;

        let required = required_width(&trees);
        if let Some(n) = num_feature.filter(|&n| required > n) {
            return Err(ModelError::Invalid(format!(
                "trees split on feature {} but num_feature is {}",
                required - 1,
                n
            )));
        }

        let feature_names = if learner.feature_names.is_empty() {
            None
        } else {
            Some(learner.feature_names)
        };

        Ok(Self {
            trees,
            base_margin: link.inverse(base_score),
            link,
            objective: learner.objective.name,
            num_feature,
            feature_names,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for XgbModel {
    fn n_features(&self) -> Option<usize> {
        self.num_feature
    }

    fn predict(&self, row: &Array1<f64>) -> Result<f64, ModelError> {
        if let Some(expected) = self.num_feature {
            if row.len() != expected {
                return Err(ModelError::ShapeMismatch {
                    stage: "model",
                    expected,
                    actual: row.len(),
                });
            }
        }

        let margin = self.base_margin + self.trees.iter().map(|t| t.leaf_value(row)).sum::<f64>();
        Ok(self.link.apply(margin))
    }

    fn describe(&self) -> ModelDescription {
        ModelDescription {
            kind: "xgboost",
            objective: self.objective.clone(),
            n_features: self.num_feature,
            trees: Some(self.tree_count()),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn required_features(&self) -> usize {
        required_width(&self.trees)
    }
}

fn required_width(trees: &[Tree]) -> usize {
    trees.iter().filter_map(Tree::max_feature).max().map_or(0, |f| f + 1)
}

fn objective_link(name: &str) -> Result<Link, ModelError> {
    match name {
        "reg:squarederror" | "reg:squaredlogerror" | "reg:pseudohubererror" | "reg:absoluteerror" => {
            Ok(Link::Identity)
        }
        "reg:logistic" | "binary:logistic" => Ok(Link::Logistic),
        other => Err(ModelError::Unsupported(format!("objective `{}`", other))),
    }
}

/// Accepts both `"5E-1"` and the bracketed `"[5E-1]"` form
fn parse_base_score(raw: &str) -> Result<f64, ModelError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or_default().trim();
    first
        .parse::<f64>()
        .map_err(|_| ModelError::Invalid(format!("base_score `{}`", raw)))
}

fn parse_count(raw: Option<&str>, name: &str) -> Result<Option<usize>, ModelError> {
    raw.map(|s| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| ModelError::Invalid(format!("{} `{}`", name, s)))
    })
    .transpose()
}
