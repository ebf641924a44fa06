//! Predictive model seam and the XGBoost JSON model loader.
//!
//! The model is loaded once at startup and only read afterwards, so a single
//! instance can be shared by every prediction.

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::demand::FeatureVector;
use crate::error::Error;

/// Anything that can score feature rows.
///
/// Implementations return one prediction per input row, in input order.
pub trait DemandModel: Send + Sync {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>>;
}

impl<F> DemandModel for F
where
    F: Fn(&[FeatureVector]) -> Result<Vec<f64>> + Send + Sync,
{
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        self(rows)
    }
}

/// How the summed tree margin maps to the prediction scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Identity,
    Log,
}

impl Link {
    fn for_objective(name: &str) -> Result<Self> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:absoluteerror" | "reg:pseudohubererror" => {
                Ok(Link::Identity)
            }
            "count:poisson" | "reg:gamma" | "reg:tweedie" => Ok(Link::Log),
            other => bail!("unsupported objective '{other}'"),
        }
    }

    fn base_margin(self, base_score: f64) -> Result<f64> {
        match self {
            Link::Identity => Ok(base_score),
            Link::Log => {
                ensure!(base_score > 0.0, "base_score must be positive for a log link");
                Ok(base_score.ln())
            }
        }
    }

    fn apply(self, margin: f64) -> f64 {
        match self {
            Link::Identity => margin,
            Link::Log => margin.exp(),
        }
    }
}

/// One regression tree in XGBoost's array layout.
#[derive(Debug, Clone)]
struct Tree {
    left: Vec<i32>,
    right: Vec<i32>,
    split_index: Vec<usize>,
    split_condition: Vec<f64>,
    default_left: Vec<bool>,
}

impl Tree {
    fn leaf_value(&self, row: &[f64; 5]) -> f64 {
        let mut node = 0usize;
        // Validated at load: children are in range and the walk terminates.
        while self.left[node] >= 0 {
            let value = row[self.split_index[node]];
            let go_left = if value.is_nan() {
                self.default_left[node]
            } else {
                // XGBoost stores thresholds as f32 and compares in f32.
                (value as f32) < (self.split_condition[node] as f32)
            };
            let next = if go_left { self.left[node] } else { self.right[node] };
            node = next as usize;
        }
        self.split_condition[node]
    }

    fn validate(&self) -> Result<()> {
        let n = self.left.len();
        ensure!(n > 0, "tree has no nodes");
        ensure!(
            self.right.len() == n
                && self.split_index.len() == n
                && self.split_condition.len() == n
                && self.default_left.len() == n,
            "tree arrays have inconsistent lengths"
        );
        for node in 0..n {
            let (l, r) = (self.left[node], self.right[node]);
            if l < 0 {
                continue;
            }
            // Children always come after their parent, so every walk ends at a leaf.
            ensure!(
                (l as usize) > node && (l as usize) < n && r > l && (r as usize) < n,
                "node {node} has invalid children ({l}, {r})"
            );
            ensure!(
                self.split_index[node] < FeatureVector::COLUMNS.len(),
                "node {node} splits on unknown feature {}",
                self.split_index[node]
            );
        }
        Ok(())
    }
}

/// A gradient-boosted tree ensemble exported with XGBoost's
/// `Booster.save_model("model.json")`.
#[derive(Debug, Clone)]
pub struct GradientBoostedModel {
    trees: Vec<Tree>,
    base_margin: f64,
    link: Link,
}

impl GradientBoostedModel {
    /// Loads and validates a model file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let model = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|json| Self::from_json(&json))
            .map_err(|e| Error::ModelLoad(format!("{e:#}")))?;

        info!(
            path = %path.display(),
            trees = model.trees.len(),
            link = ?model.link,
            "Demand model loaded"
        );
        Ok(model)
    }

    /// Parses a model from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: ModelDocument = serde_json::from_str(json).context("parsing model JSON")?;
        let learner = doc.learner;

        if !learner.feature_names.is_empty() {
            ensure!(
                learner.feature_names == FeatureVector::COLUMNS,
                "model was trained on columns {:?}, expected {:?}",
                learner.feature_names,
                FeatureVector::COLUMNS
            );
        }

        let num_feature: usize = learner
            .learner_model_param
            .num_feature
            .trim()
            .parse()
            .context("parsing num_feature")?;
        ensure!(
            num_feature == FeatureVector::COLUMNS.len(),
            "model expects {num_feature} features, expected {}",
            FeatureVector::COLUMNS.len()
        );

        ensure!(
            learner.gradient_booster.name == "gbtree",
            "unsupported booster '{}'",
            learner.gradient_booster.name
        );

        let link = Link::for_objective(&learner.objective.name)?;
        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let base_margin = link.base_margin(base_score)?;

        let trees = learner
            .gradient_booster
            .model
            .ok_or_else(|| anyhow!("gbtree booster has no model"))?
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| -> Result<Tree> {
                raw.check_supported().with_context(|| format!("tree {i}"))?;
                let tree = Tree {
                    left: raw.left_children,
                    right: raw.right_children,
                    split_index: raw.split_indices,
                    split_condition: raw.split_conditions,
                    default_left: raw.default_left.into_iter().map(Flag::is_set).collect(),
                };
                tree.validate().with_context(|| format!("tree {i}"))?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            trees,
            base_margin,
            link,
        })
    }

    pub fn link(&self) -> Link {
        self.link
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn score(&self, row: &FeatureVector) -> f64 {
        let values = row.values();
        let margin = self.base_margin
            + self
                .trees
                .iter()
                .map(|t| t.leaf_value(&values))
                .sum::<f64>();
        self.link.apply(margin)
    }
}

impl DemandModel for GradientBoostedModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<f64>> {
        Ok(rows.iter().map(|row| self.score(row)).collect())
    }
}

/// XGBoost 1.x writes `"5E-1"`, 2.x writes `"[5E-1]"`.
fn parse_base_score(raw: &str) -> Result<f64> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']').trim();
    trimmed
        .parse()
        .with_context(|| format!("parsing base_score '{raw}'"))
}

#[derive(Deserialize)]
struct ModelDocument {
    learner: Learner,
}

#[derive(Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Deserialize)]
struct GradientBooster {
    name: String,
    model: Option<TreeEnsemble>,
}

#[derive(Deserialize)]
struct TreeEnsemble {
    trees: Vec<RawTree>,
}

#[derive(Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<usize>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
    /// 0 numerical, 1 categorical.
    #[serde(default)]
    split_type: Vec<u8>,
    #[serde(default)]
    tree_param: Option<TreeParam>,
}

impl RawTree {
    /// Only numerical splits with scalar leaves can be scored.
    fn check_supported(&self) -> Result<()> {
        if let Some(node) = self.split_type.iter().position(|&t| t != 0) {
            bail!(
                "node {node} uses a categorical split (split_type {}), which is not supported",
                self.split_type[node]
            );
        }
        if let Some(size) = self
            .tree_param
            .as_ref()
            .and_then(|p| p.size_leaf_vector.as_deref())
        {
            // 1.x writes "0" for scalar leaves, 2.x writes "1".
            let size: usize = size
                .trim()
                .parse()
                .with_context(|| format!("parsing size_leaf_vector '{size}'"))?;
            ensure!(
                size <= 1,
                "vector leaves (size_leaf_vector {size}) are not supported"
            );
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct TreeParam {
    #[serde(default)]
    size_leaf_vector: Option<String>,
}

#[derive(Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

#[derive(Deserialize)]
struct Objective {
    name: String,
}

/// `default_left` is `0`/`1` in JSON exports and `true`/`false` in others.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}
