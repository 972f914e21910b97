// src/store/history.rs
// Ledger is the source of truth and is written before the index.
// `open` repairs an index that fell behind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Paths;
use crate::config::consts::STORE_SEP;
use crate::csv::decode_rows;
use crate::data::{OutcomeRecord, period_order};
use crate::error::StoreError;
use crate::file::{append_rows, read_or_empty, write_atomic};

pub struct HistoryStore {
    ledger: PathBuf,
    index: PathBuf,
    known: HashSet<String>,
}

impl HistoryStore {
    pub fn open(paths: &Paths) -> Result<Self, StoreError> {
        Self::open_at(&paths.ledger(), &paths.known_periods())
    }

    /// Open with explicit file locations and reconcile the index with the ledger.
    pub fn open_at(ledger: &Path, index: &Path) -> Result<Self, StoreError> {
        let mut store = Self {
            ledger: ledger.to_path_buf(),
            index: index.to_path_buf(),
            known: HashSet::new(),
        };
        store.known = store.load_known_periods()?;

        let indexed = store.known.len();
        let mut missing = 0usize;
        for rec in store.load_records()? {
            if store.known.insert(rec.period_id) {
                missing += 1;
            }
        }
        if missing > 0 {
            info!(missing, indexed, "known-period index was behind the ledger; repaired");
            store.persist_known_periods()?;
        }
        debug!(known = store.known.len(), ledger = %store.ledger.display(), "history store open");
        Ok(store)
    }

    pub fn known(&self) -> &HashSet<String> {
        &self.known
    }

    pub fn contains(&self, period_id: &str) -> bool {
        self.known.contains(period_id)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger
    }

    /// Append the records whose period ids are not yet known and return them.
    ///
    /// Ids repeated inside the batch count once (first occurrence wins). New
    /// records are written oldest first, so the ledger stays chronological
    /// whatever order the page listed them in.
    pub fn append_if_new(&mut self, records: &[OutcomeRecord]) -> Result<Vec<OutcomeRecord>, StoreError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut fresh: Vec<OutcomeRecord> = records
            .iter()
            .filter(|r| !self.known.contains(&r.period_id) && seen.insert(r.period_id.as_str()))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Ok(fresh);
        }
        fresh.sort_by(|a, b| period_order(&a.period_id, &b.period_id));

        let rows: Vec<Vec<String>> = fresh.iter().map(OutcomeRecord::to_row).collect();
        append_rows(&self.ledger, Some(&OutcomeRecord::HEADERS[..]), &rows, STORE_SEP)?;

        self.known.extend(fresh.iter().map(|r| r.period_id.clone()));
        self.persist_known_periods()?;
        debug!(added = fresh.len(), total = self.known.len(), "ledger appended");
        Ok(fresh)
    }

    /// Period ids recorded in the index file (missing file = empty set).
    pub fn load_known_periods(&self) -> Result<HashSet<String>, StoreError> {
        load_known_periods(&self.index)
    }

    /// Rewrite the index from the in-memory set.
    pub fn persist_known_periods(&self) -> Result<(), StoreError> {
        persist_known_periods(&self.index, &self.known)
    }

    /// Every ledger record in file order. Unreadable lines are skipped with a
    /// warning; they never make the whole history unavailable.
    pub fn load_records(&self) -> Result<Vec<OutcomeRecord>, StoreError> {
        load_records(&self.ledger)
    }

    /// Forget everything: remove both files and clear the set.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        for path in [&self.ledger, &self.index] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path.as_path(), e)),
            }
        }
        self.known.clear();
        warn!(ledger = %self.ledger.display(), "history reset");
        Ok(())
    }
}

pub fn load_known_periods(index: &Path) -> Result<HashSet<String>, StoreError> {
    let text = read_or_empty(index)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Newline-delimited, in period order, replaced atomically.
pub fn persist_known_periods(index: &Path, known: &HashSet<String>) -> Result<(), StoreError> {
    let mut ids: Vec<&str> = known.iter().map(String::as_str).collect();
    ids.sort_by(|a, b| period_order(a, b));
    let mut body = ids.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    write_atomic(index, body.as_bytes())
}

pub fn load_records(ledger: &Path) -> Result<Vec<OutcomeRecord>, StoreError> {
    let text = read_or_empty(ledger)?;
    let (records, bad) = decode_rows(&text, STORE_SEP, Some(&OutcomeRecord::HEADERS[..]), OutcomeRecord::from_row);
    for b in bad {
        warn!(path = %ledger.display(), line = b.line, "skipping ledger row: {}", b.reason);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Color, Size};

    fn rec(p: &str, n: u8) -> OutcomeRecord {
        OutcomeRecord::new(p, n, Size::for_number(n), Color::Red)
    }

    fn store(dir: &Path) -> HistoryStore {
        HistoryStore::open_at(&dir.join("ledger.csv"), &dir.join("known.txt")).unwrap()
    }

    #[test]
    fn append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let batch = vec![rec("P2", 7), rec("P1", 3)];

        let added = s.append_if_new(&batch).unwrap();
        assert_eq!(added.iter().map(|r| r.period_id.as_str()).collect::<Vec<_>>(), vec!["P1", "P2"]);
        assert!(s.append_if_new(&batch).unwrap().is_empty());
        assert_eq!(s.load_records().unwrap().len(), 2);
    }

    #[test]
    fn duplicates_inside_a_batch_count_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        let added = s.append_if_new(&[rec("P1", 3), rec("P1", 8)]).unwrap();
        assert_eq!(added, vec![rec("P1", 3)]);
    }

    #[test]
    fn header_written_once_and_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        s.append_if_new(&[rec("P1", 1)]).unwrap();
        s.append_if_new(&[rec("P2", 9)]).unwrap();

        let text = fs::read_to_string(s.ledger_path()).unwrap();
        assert_eq!(text, "Period,Number,Size,Color\nP1,1,Small,Red\nP2,9,Big,Red\n");
        assert_eq!(s.load_records().unwrap(), vec![rec("P1", 1), rec("P2", 9)]);
    }

    #[test]
    fn reopen_repairs_a_stale_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut s = store(dir.path());
            s.append_if_new(&[rec("P1", 1), rec("P2", 2)]).unwrap();
        }
        // Simulate a crash after the ledger write but before the index write.
        fs::write(dir.path().join("known.txt"), "P1\n").unwrap();

        let s = store(dir.path());
        assert!(s.contains("P2"));
        assert_eq!(fs::read_to_string(dir.path().join("known.txt")).unwrap(), "P1\nP2\n");
    }

    #[test]
    fn bad_ledger_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("ledger.csv");
        fs::write(&ledger, "Period,Number,Size,Color\nP1,3,Small,Red\nP2,eleven,Big,Red\nP3,6,Big,Green\n").unwrap();
        let ids: Vec<String> = load_records(&ledger).unwrap().into_iter().map(|r| r.period_id).collect();
        assert_eq!(ids, vec!["P1", "P3"]);
    }

    #[test]
    fn reset_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(dir.path());
        s.append_if_new(&[rec("P1", 1)]).unwrap();
        s.reset().unwrap();
        assert!(s.is_empty());
        assert!(s.load_records().unwrap().is_empty());
        assert_eq!(s.append_if_new(&[rec("P1", 1)]).unwrap().len(), 1);
    }
}
