// src/model/classifier.rs
// Categorical naive Bayes, Laplace smoothing. BTreeMaps keep ties and
// serialisation stable: smallest label wins.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::features::FeatureVec;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub count: usize,
    /// Per feature column: category → occurrences within this class.
    pub values: Vec<BTreeMap<i8, usize>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayes {
    pub classes: BTreeMap<String, ClassStats>,
    /// Distinct categories seen per column over the whole training set.
    pub cardinality: Vec<usize>,
    pub total: usize,
}

impl NaiveBayes {
    pub fn fit(x: &[FeatureVec], y: &[String]) -> Self {
        let width = x.first().map_or(0, |v| v.len());
        let mut classes: BTreeMap<String, ClassStats> = BTreeMap::new();
        let mut seen: Vec<BTreeSet<i8>> = vec![BTreeSet::new(); width];

        for (row, label) in x.iter().zip(y) {
            let stats = classes.entry(label.clone()).or_insert_with(|| ClassStats {
                count: 0,
                values: vec![BTreeMap::new(); width],
            });
            stats.count += 1;
            for (col, v) in row.iter().enumerate() {
                *stats.values[col].entry(*v).or_default() += 1;
                seen[col].insert(*v);
            }
        }

        Self {
            classes,
            cardinality: seen.iter().map(|s| s.len()).collect(),
            total: x.len().min(y.len()),
        }
    }

    /// Log-posterior (up to a constant) of `label` for `row`.
    fn score(&self, stats: &ClassStats, row: &FeatureVec) -> f64 {
        let prior = (stats.count as f64 / self.total.max(1) as f64).ln();
        row.iter().enumerate().fold(prior, |acc, (col, v)| {
            let hits = stats.values.get(col).and_then(|m| m.get(v)).copied().unwrap_or(0);
            // +1 slot for categories never seen in training.
            let k = self.cardinality.get(col).copied().unwrap_or(0) + 1;
            acc + ((hits + 1) as f64 / (stats.count + k) as f64).ln()
        })
    }

    /// Most probable label, `None` for an untrained model.
    pub fn predict(&self, row: &FeatureVec) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, stats) in &self.classes {
            let s = self.score(stats, row);
            if best.is_none_or(|(_, b)| s > b) {
                best = Some((label.as_str(), s));
            }
        }
        best.map(|(l, _)| l)
    }

    pub fn accuracy(&self, x: &[FeatureVec], y: &[String]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let hits = x
            .iter()
            .zip(y)
            .filter(|(row, label)| self.predict(row) == Some(label.as_str()))
            .count();
        hits as f64 / x.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn learns_a_deterministic_mapping() {
        let x = vec![[0, 0, 0, -1, -1], [1, 1, 1, 0, 0], [0, 0, 0, 1, 1], [1, 1, 1, 0, 0]];
        let y = labels(&["Green_Big", "Red_Small", "Green_Big", "Red_Small"]);
        let nb = NaiveBayes::fit(&x, &y);
        assert_eq!(nb.predict(&[0, 0, 0, 1, 1]), Some("Green_Big"));
        assert_eq!(nb.predict(&[1, 1, 1, 0, 0]), Some("Red_Small"));
        assert_eq!(nb.accuracy(&x, &y), 1.0);
    }

    #[test]
    fn ties_go_to_the_smallest_label() {
        let x = vec![[0, 0, 0, 0, 0], [0, 0, 0, 0, 0]];
        let y = labels(&["Red_Small", "Blue_Big"]);
        let nb = NaiveBayes::fit(&x, &y);
        assert_eq!(nb.predict(&[0, 0, 0, 0, 0]), Some("Blue_Big"));
    }

    #[test]
    fn unseen_categories_do_not_panic() {
        let nb = NaiveBayes::fit(&[[0, 0, 0, 0, 0]], &labels(&["Red_Small"]));
        assert_eq!(nb.predict(&[4, 1, 1, 4, 1]), Some("Red_Small"));
        assert_eq!(NaiveBayes::default().predict(&[0; 5]), None);
    }

    #[test]
    fn survives_json() {
        let nb = NaiveBayes::fit(&[[0, 1, 0, -1, -1]], &labels(&["Violet_Big"]));
        let back: NaiveBayes = serde_json::from_str(&serde_json::to_string(&nb).unwrap()).unwrap();
        assert_eq!(back, nb);
    }
}
