// src/model/mod.rs
pub mod artifact;
pub mod classifier;
pub mod features;
pub mod regressor;
pub mod train;

pub use artifact::{Artifact, Metadata, Metric};
pub use classifier::NaiveBayes;
pub use features::{FEATURES, FeatureVec, features_for};
pub use regressor::Ridge;
pub use train::{TrainReport, train, train_ledger};
