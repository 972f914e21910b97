// src/store/verification.rs
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::consts::STORE_SEP;
use crate::csv::decode_rows;
use crate::data::VerificationRecord;
use crate::error::StoreError;
use crate::file::{append_rows, read_or_empty};

/// Append-only audit trail of checked predictions.
pub struct VerificationLog {
    path: PathBuf,
}

/// Running hit rate over the whole trail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub checked: usize,
    pub correct: usize,
}

impl Tally {
    pub fn accuracy(&self) -> Option<f64> {
        (self.checked > 0).then(|| self.correct as f64 / self.checked as f64)
    }
}

impl VerificationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, rec: &VerificationRecord) -> Result<(), StoreError> {
        append_rows(&self.path, Some(&VerificationRecord::HEADERS[..]), &[rec.to_row()], STORE_SEP)
    }

    pub fn load(&self) -> Result<Vec<VerificationRecord>, StoreError> {
        let text = read_or_empty(&self.path)?;
        // Older files only carry the first three header columns.
        let header = &VerificationRecord::HEADERS[..3];
        let (records, bad) = decode_rows(&text, STORE_SEP, Some(header), VerificationRecord::from_row);
        for b in bad {
            warn!(path = %self.path.display(), line = b.line, "skipping verification row: {}", b.reason);
        }
        Ok(records)
    }

    pub fn tally(&self) -> Result<Tally, StoreError> {
        let recs = self.load()?;
        Ok(Tally {
            checked: recs.len(),
            correct: recs.iter().filter(|r| r.is_correct).count(),
        })
    }
}
