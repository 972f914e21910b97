// src/store/mod.rs
// Single-writer files, no locking.

pub mod history;
pub mod prediction_log;
pub mod verification;

pub use history::HistoryStore;
pub use prediction_log::PredictionLog;
pub use verification::VerificationLog;
