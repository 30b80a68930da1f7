use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{FeatureKind, FeatureValue, FeatureVector, FEATURE_KINDS, FEATURE_NAMES};

/// The inference seam. The server only ever sees this trait, so tests can
/// hand it a stub instead of a trained artifact.
pub trait Predictor: Send + Sync {
    /// Estimated total delay minutes. May be negative for inputs far from
    /// the training distribution.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

// ---------- Artifact JSON ----------

#[derive(Deserialize)]
struct ArtifactJson {
    feat_list: Vec<String>,
    #[serde(default)]
    categories: HashMap<String, Vec<String>>,
    #[serde(default)]
    base_score: f64,
    trees: Vec<NodeJson>,
    #[serde(default)]
    meta: Option<ModelMeta>,
}

// Tree dump node: either a leaf or a split with its two children inlined.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeJson {
    Leaf {
        nodeid: u32,
        leaf: f64,
    },
    Split {
        nodeid: u32,
        split: String,
        split_condition: f64,
        yes: u32,
        no: u32,
        children: Vec<NodeJson>,
    },
}

/// Descriptive text shipped with the artifact, shown in the "About the
/// Model" panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMeta {
    pub name: String,
    pub trained_on: String,
    pub goal: String,
    pub score: Option<String>,
}

impl Default for ModelMeta {
    fn default() -> Self {
        Self {
            name: "Gradient-boosted regressor".to_string(),
            trained_on: "U.S. airline on-time performance records".to_string(),
            goal: "Predict total delay minutes in a given month".to_string(),
            score: None,
        }
    }
}

// ---------- Compiled model ----------

#[derive(Debug)]
enum Encoder {
    Numeric,
    Categorical(Vec<String>),
}

impl Encoder {
    fn levels(&self) -> &[String] {
        match self {
            Encoder::Numeric => &[],
            Encoder::Categorical(levels) => levels,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
    },
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn eval(&self, x: &[f64]) -> f64 {
        // Children always sit at a higher index than their parent, so the
        // walk terminates.
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split { feature, threshold, yes, no } => {
                    idx = if x[feature] < threshold { yes } else { no };
                }
            }
        }
    }
}

/// Regression artifact produced by the external training pipeline, loaded
/// once and read-only afterwards.
#[derive(Debug)]
pub struct DelayModel {
    feat_list: Vec<String>,
    encoders: Vec<Encoder>,
    base_score: f64,
    trees: Vec<Tree>,
    meta: ModelMeta,
}

impl DelayModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ArtifactJson =
            serde_json::from_str(&txt).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::compile(artifact)
    }

    #[cfg(test)]
    pub(crate) fn from_json(txt: &str) -> Result<Self, ModelError> {
        let artifact: ArtifactJson = serde_json::from_str(txt).map_err(|source| {
            ModelError::Parse {
                path: "<memory>".into(),
                source,
            }
        })?;
        Self::compile(artifact)
    }

    fn compile(artifact: ArtifactJson) -> Result<Self, ModelError> {
        if artifact.feat_list != FEATURE_NAMES {
            return Err(ModelError::Incompatible(format!(
                "feat_list {:?} does not match expected {:?}",
                artifact.feat_list, FEATURE_NAMES
            )));
        }
        if artifact.trees.is_empty() {
            return Err(ModelError::Incompatible("artifact contains no trees".into()));
        }

        let mut categories = artifact.categories;
        let mut encoders = Vec::with_capacity(FEATURE_NAMES.len());
        for (name, kind) in FEATURE_NAMES.iter().zip(FEATURE_KINDS) {
            let encoder = match (kind, categories.remove(*name)) {
                (FeatureKind::Numeric, None) => Encoder::Numeric,
                (FeatureKind::Categorical, Some(levels)) if !levels.is_empty() => {
                    Encoder::Categorical(levels)
                }
                (FeatureKind::Numeric, Some(_)) => {
                    return Err(ModelError::Incompatible(format!(
                        "numeric feature {name} has a category list"
                    )));
                }
                (FeatureKind::Categorical, _) => {
                    return Err(ModelError::Incompatible(format!(
                        "categorical feature {name} has no category list"
                    )));
                }
            };
            encoders.push(encoder);
        }
        if let Some(extra) = categories.keys().next() {
            return Err(ModelError::Incompatible(format!(
                "category list for unknown feature {extra}"
            )));
        }
        if !artifact.base_score.is_finite() {
            return Err(ModelError::Incompatible("base_score is not finite".into()));
        }

        let trees = artifact
            .trees
            .iter()
            .enumerate()
            .map(|(i, root)| {
                compile_tree(root, &artifact.feat_list)
                    .map_err(|e| ModelError::Incompatible(format!("tree {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            feat_list: artifact.feat_list,
            encoders,
            base_score: artifact.base_score,
            trees,
            meta: artifact.meta.unwrap_or_default(),
        })
    }

    pub fn feat_list(&self) -> &[String] {
        &self.feat_list
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Maps the named fields onto the numeric row the trees were trained on.
    fn encode(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        features
            .fields()
            .iter()
            .zip(&self.encoders)
            .map(|((name, value), encoder)| match value {
                FeatureValue::Int(v) => Ok(*v as f64),
                FeatureValue::Float(v) => Ok(*v),
                FeatureValue::Category(code) => encoder
                    .levels()
                    .iter()
                    .position(|l| l == code)
                    .map(|i| i as f64)
                    .ok_or_else(|| {
                        ModelError::SchemaMismatch(format!(
                            "{name} {code:?} was not part of the training data"
                        ))
                    }),
            })
            .collect()
    }
}

impl Predictor for DelayModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let x = self.encode(features)?;
        let minutes = self.base_score + self.trees.iter().map(|t| t.eval(&x)).sum::<f64>();
        if !minutes.is_finite() {
            return Err(ModelError::SchemaMismatch(format!(
                "model produced a non-finite value ({minutes})"
            )));
        }
        Ok(minutes)
    }
}

/// Flattens a nested tree dump into an arena in pre-order, resolving the
/// `yes`/`no` node ids against each split's own children.
fn compile_tree(root: &NodeJson, feat_list: &[String]) -> Result<Tree, String> {
    let mut nodes = Vec::new();
    push_node(root, feat_list, &mut nodes)?;
    Ok(Tree { nodes })
}

fn push_node(node: &NodeJson, feat_list: &[String], nodes: &mut Vec<Node>) -> Result<usize, String> {
    let idx = nodes.len();
    match node {
        NodeJson::Leaf { leaf, nodeid } => {
            if !leaf.is_finite() {
                return Err(format!("node {nodeid} has a non-finite leaf"));
            }
            nodes.push(Node::Leaf(*leaf));
        }
        NodeJson::Split {
            nodeid,
            split,
            split_condition,
            yes,
            no,
            children,
        } => {
            let feature = feat_list
                .iter()
                .position(|f| f == split)
                .ok_or_else(|| format!("node {nodeid} splits on unknown feature {split:?}"))?;
            if children.len() != 2 {
                return Err(format!("node {nodeid} has {} children, expected 2", children.len()));
            }
            // Placeholder until the children have positions.
            nodes.push(Node::Leaf(0.0));

            let mut by_id = HashMap::new();
            for child in children {
                let child_id = match child {
                    NodeJson::Leaf { nodeid, .. } | NodeJson::Split { nodeid, .. } => *nodeid,
                };
                let pos = push_node(child, feat_list, nodes)?;
                if by_id.insert(child_id, pos).is_some() {
                    return Err(format!("node {nodeid} has duplicate child id {child_id}"));
                }
            }
            if yes == no {
                return Err(format!("node {nodeid} routes both branches to child {yes}"));
            }
            let resolve = |id: &u32| {
                by_id
                    .get(id)
                    .copied()
                    .ok_or_else(|| format!("node {nodeid} points to missing child {id}"))
            };
            nodes[idx] = Node::Split {
                feature,
                threshold: *split_condition,
                yes: resolve(yes)?,
                no: resolve(no)?,
            };
        }
    }
    Ok(idx)
}
