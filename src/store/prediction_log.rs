// src/store/prediction_log.rs
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::consts::STORE_SEP;
use crate::csv::{decode_rows, parse_rows};
use crate::data::Prediction;
use crate::error::StoreError;
use crate::file::{append_rows, read_or_empty};

/// `timestamp,color_size,number` per line, no header.
pub struct PredictionLog {
    path: PathBuf,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, p: &Prediction) -> Result<(), StoreError> {
        append_rows::<String>(&self.path, None, &[p.to_row()], STORE_SEP)
    }

    pub fn load(&self) -> Result<Vec<Prediction>, StoreError> {
        let text = read_or_empty(&self.path)?;
        let (preds, bad) = decode_rows(&text, STORE_SEP, None, Prediction::from_row);
        for b in bad {
            warn!(path = %self.path.display(), line = b.line, "skipping prediction: {}", b.reason);
        }
        Ok(preds)
    }

    /// Newest readable entry, if any.
    pub fn last(&self) -> Result<Option<Prediction>, StoreError> {
        let text = read_or_empty(&self.path)?;
        Ok(parse_rows(&text, STORE_SEP)
            .iter()
            .rev()
            .find_map(|row| Prediction::from_row(row).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_ts;

    #[test]
    fn last_skips_a_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("p.txt"));
        let ts = parse_ts("2025-03-01 12:00:00").unwrap();
        log.append(&Prediction { timestamp: ts, color_size: Some(s!("Red_Big")), number: Some(6) }).unwrap();
        log.append(&Prediction { timestamp: ts, color_size: None, number: Some(2) }).unwrap();
        std::fs::write(
            log.path(),
            std::fs::read_to_string(log.path()).unwrap() + "2025-03-01 12:0",
        )
        .unwrap();

        let last = log.last().unwrap().unwrap();
        assert_eq!(last.color_size, None);
        assert_eq!(last.number, Some(2));
        assert_eq!(log.load().unwrap().len(), 2);
    }

    #[test]
    fn degraded_fields_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("p.txt"));
        let ts = parse_ts("2025-03-01 12:00:00").unwrap();
        log.append(&Prediction { timestamp: ts, color_size: Some(s!("Green_Small")), number: None }).unwrap();
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "2025-03-01 12:00:00,Green_Small,\n");
    }

    #[test]
    fn empty_log_has_no_last() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PredictionLog::new(dir.path().join("p.txt")).last().unwrap().is_none());
    }
}
