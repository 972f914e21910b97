// src/progress.rs
use crate::data::{OutcomeRecord, Prediction, VerificationRecord};
use crate::monitor::State;

/// Lightweight progress reporting for the long-running monitor.
/// Frontends implement this to surface status to users; every hook is optional.
pub trait Progress {
    /// A cycle is starting (1-based).
    fn cycle(&mut self, _n: u64) {}

    /// The loop moved to another state.
    fn state(&mut self, _state: State) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// Records persisted this cycle, oldest first.
    fn new_records(&mut self, _records: &[OutcomeRecord]) {}

    fn verified(&mut self, _rec: &VerificationRecord) {}

    fn predicted(&mut self, _p: &Prediction) {}

    fn trained(&mut self, _accuracy: f64, _mse: f64) {}

    /// An empty or failed cycle; `attempt` counts up to the retry limit.
    fn retry(&mut self, _attempt: u32, _max: u32) {}

    /// Called once when the loop stops, cancelled or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
