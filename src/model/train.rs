// src/model/train.rs
// Sample i: features of record i (and i-1), label from record i+1.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{error, info};

use super::artifact::{Artifact, Metric};
use super::classifier::NaiveBayes;
use super::features::{FeatureVec, features_for};
use super::regressor::Ridge;
use crate::config::{Paths, TrainOptions};
use crate::data::OutcomeRecord;
use crate::error::TrainError;
use crate::store::history;

/// Feature rows with both targets, in ledger order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub x: Vec<FeatureVec>,
    pub labels: Vec<String>,
    pub numbers: Vec<f64>,
}

impl Dataset {
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut ds = Dataset::default();
        for i in 0..records.len().saturating_sub(1) {
            let prev = i.checked_sub(1).map(|j| &records[j]);
            let next = &records[i + 1];
            ds.x.push(features_for(&records[i], prev));
            ds.labels.push(next.color_size());
            ds.numbers.push(next.number as f64);
        }
        ds
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn subset(&self, idx: &[usize]) -> Dataset {
        Dataset {
            x: idx.iter().map(|&i| self.x[i]).collect(),
            labels: idx.iter().map(|&i| self.labels[i].clone()).collect(),
            numbers: idx.iter().map(|&i| self.numbers[i]).collect(),
        }
    }
}

/// Seeded shuffle, then the first `ceil(fraction * n)` indices are the test set.
/// Returns `(train, test)`.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    let test_n = ((test_fraction * n as f64).ceil() as usize).min(n.saturating_sub(1));
    let train = idx.split_off(test_n);
    (train, idx)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainReport {
    pub records: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub accuracy: f64,
    pub mse: f64,
    pub color_size_model: PathBuf,
    pub number_model: PathBuf,
}

/// Train both models on `records` and write the artifacts under `paths`.
/// Nothing is written when there are too few records.
pub fn train(records: &[OutcomeRecord], paths: &Paths, opts: &TrainOptions) -> Result<TrainReport, TrainError> {
    let t = Instant::now();
    if records.len() < opts.min_records {
        return Err(TrainError::Insufficient { have: records.len(), need: opts.min_records });
    }

    let ds = Dataset::from_records(records);
    let (train_idx, test_idx) = split_indices(ds.len(), opts.test_fraction, opts.seed);
    let fit = ds.subset(&train_idx);
    // An empty test split (fraction 0) scores on the training rows.
    let eval = if test_idx.is_empty() { fit.clone() } else { ds.subset(&test_idx) };

    let nb = NaiveBayes::fit(&fit.x, &fit.labels);
    let accuracy = nb.accuracy(&eval.x, &eval.labels);
    info!("Color+Size model accuracy: {:.2}%", accuracy * 100.0);

    let ridge = Ridge::fit(&fit.x, &fit.numbers);
    let mse = ridge.mse(&eval.x, &eval.numbers);
    info!("Number model MSE: {mse:.4}");

    let color_size_model = paths.color_size_model();
    let number_model = paths.number_model();
    Artifact::new(nb, Metric::Accuracy(accuracy)).save(&color_size_model)?;
    Artifact::new(ridge, Metric::Mse(mse)).save(&number_model)?;

    info!(records = records.len(), elapsed = ?t.elapsed(), "training complete");
    Ok(TrainReport {
        records: records.len(),
        train_size: train_idx.len(),
        test_size: test_idx.len(),
        accuracy,
        mse,
        color_size_model,
        number_model,
    })
}

/// Train from a ledger file.
pub fn train_ledger(ledger: &Path, paths: &Paths, opts: &TrainOptions) -> Result<TrainReport, TrainError> {
    if !ledger.exists() {
        return Err(TrainError::MissingLedger(ledger.to_path_buf()));
    }
    let records = history::load_records(ledger)?;
    train(&records, paths, opts)
}

/// Boolean form for callers that only need to know whether it worked.
pub fn train_ok(records: &[OutcomeRecord], paths: &Paths, opts: &TrainOptions) -> bool {
    match train(records, paths, opts) {
        Ok(_) => true,
        Err(e) => {
            error!("Training failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Color, Size};

    fn history(n: usize) -> Vec<OutcomeRecord> {
        (0..n)
            .map(|i| {
                let number = ((i * 7 + 3) % 10) as u8;
                let color = Color::KNOWN[i % Color::KNOWN.len()];
                OutcomeRecord::new(format!("P{}", i + 1), number, Size::for_number(number), color)
            })
            .collect()
    }

    #[test]
    fn labels_come_from_the_next_record() {
        let recs = history(3);
        let ds = Dataset::from_records(&recs);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels[0], recs[1].color_size());
        assert_eq!(ds.numbers[1], recs[2].number as f64);
        assert_eq!(ds.x[0][3], -1);
    }

    #[test]
    fn split_is_seeded_and_sized() {
        let (tr, te) = split_indices(9, 0.2, 42);
        assert_eq!((tr.len(), te.len()), (7, 2));
        assert_eq!(split_indices(9, 0.2, 42), (tr.clone(), te.clone()));
        let mut all: Vec<usize> = tr.into_iter().chain(te).collect();
        all.sort();
        assert_eq!(all, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn too_few_records_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        let err = train(&history(9), &paths, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::Insufficient { have: 9, need: 10 }));
        assert!(!paths.color_size_model().exists());
        assert!(!paths.number_model().exists());
        assert!(!train_ok(&history(3), &paths, &TrainOptions::default()));
    }

    #[test]
    fn missing_ledger_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        let err = train_ledger(&paths.ledger(), &paths, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::MissingLedger(ref p) if *p == paths.ledger()));

        crate::report::log_error(&paths.error_log(), "Model training failed", &err);
        let log = std::fs::read_to_string(paths.error_log()).unwrap();
        assert!(log.contains("Model training failed: training data not found"));
    }

    #[test]
    fn training_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        let recs = history(25);
        let a = train(&recs, &paths, &TrainOptions::default()).unwrap();
        let first: Artifact<NaiveBayes> = Artifact::load(&paths.color_size_model()).unwrap();
        let b = train(&recs, &paths, &TrainOptions::default()).unwrap();
        let second: Artifact<NaiveBayes> = Artifact::load(&paths.color_size_model()).unwrap();

        assert_eq!(a, b);
        assert_eq!(first.model, second.model);
        assert_eq!(a.test_size, 5);
        assert!((0.0..=1.0).contains(&a.accuracy));
        assert!(a.mse.is_finite());
    }
}
