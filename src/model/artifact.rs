// src/model/artifact.rs
//! On-disk model files: `{ model, metadata: { metric, feature_list }, timestamp }`.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::features::{FEATURES, matches_feature_list};
use crate::data::now;
use crate::error::TrainError;
use crate::file::write_atomic;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Accuracy(f64),
    Mse(f64),
}

impl Metric {
    pub fn value(&self) -> f64 {
        match self {
            Metric::Accuracy(v) | Metric::Mse(v) => *v,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub metric: Metric,
    pub feature_list: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artifact<M> {
    pub model: M,
    pub metadata: Metadata,
    pub timestamp: NaiveDateTime,
}

impl<M> Artifact<M> {
    /// Wrap a freshly fitted model, stamped now, with our feature list.
    pub fn new(model: M, metric: Metric) -> Self {
        Self {
            model,
            metadata: Metadata {
                metric,
                feature_list: FEATURES.iter().map(|s| s.to_string()).collect(),
            },
            timestamp: now(),
        }
    }

    pub fn features_match(&self) -> bool {
        matches_feature_list(&self.metadata.feature_list)
    }
}

impl<M: Serialize> Artifact<M> {
    /// Replace the file at `path` atomically; a reader never sees half a model.
    pub fn save(&self, path: &Path) -> Result<(), TrainError> {
        let json = serde_json::to_vec_pretty(self).map_err(|e| TrainError::Artifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        write_atomic(path, &json)?;
        info!(path = %path.display(), metric = ?self.metadata.metric, "model saved");
        Ok(())
    }
}

impl<M: DeserializeOwned> Artifact<M> {
    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let bad = |reason: String| TrainError::Artifact { path: path.to_path_buf(), reason };
        let text = fs::read_to_string(path).map_err(|e| bad(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| bad(e.to_string()))
    }
}
