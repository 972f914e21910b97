// tests/history_store.rs
use std::collections::HashSet;

use proptest::prelude::*;

use bdg_predict::config::Paths;
use bdg_predict::data::{Color, OutcomeRecord, Size};
use bdg_predict::store::HistoryStore;

fn rec(id: u16) -> OutcomeRecord {
    let n = (id % 10) as u8;
    OutcomeRecord::new(format!("P{id}"), n, Size::for_number(n), Color::KNOWN[id as usize % 5])
}

#[test]
fn ledger_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::rooted_at(dir.path());
    {
        let mut s = HistoryStore::open(&paths).unwrap();
        s.append_if_new(&[rec(3), rec(1), rec(2)]).unwrap();
    }
    let s = HistoryStore::open(&paths).unwrap();
    assert_eq!(s.len(), 3);
    assert_eq!(s.load_records().unwrap(), vec![rec(1), rec(2), rec(3)]);
    let ids = std::fs::read_to_string(paths.known_periods()).unwrap();
    assert_eq!(ids, "P1\nP2\nP3\n");
}

#[test]
fn lost_index_is_rebuilt_from_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::rooted_at(dir.path());
    HistoryStore::open(&paths).unwrap().append_if_new(&[rec(1), rec(2)]).unwrap();
    std::fs::remove_file(paths.known_periods()).unwrap();

    let mut s = HistoryStore::open(&paths).unwrap();
    assert!(s.append_if_new(&[rec(2)]).unwrap().is_empty());
    assert_eq!(s.load_records().unwrap().len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn append_if_new_is_idempotent(
        first in prop::collection::vec(0u16..40, 0..25),
        second in prop::collection::vec(0u16..40, 0..25),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        let mut s = HistoryStore::open(&paths).unwrap();

        let a: Vec<OutcomeRecord> = first.iter().map(|&i| rec(i)).collect();
        let b: Vec<OutcomeRecord> = second.iter().map(|&i| rec(i)).collect();

        let added_a = s.append_if_new(&a).unwrap();
        prop_assert!(s.append_if_new(&a).unwrap().is_empty());
        let added_b = s.append_if_new(&b).unwrap();

        let expected: HashSet<u16> = first.iter().chain(&second).copied().collect();
        prop_assert_eq!(added_a.len() + added_b.len(), expected.len());

        let ledger = s.load_records().unwrap();
        let unique: HashSet<&str> = ledger.iter().map(|r| r.period_id.as_str()).collect();
        prop_assert_eq!(unique.len(), ledger.len());
        prop_assert_eq!(ledger.len(), expected.len());

        let reopened = HistoryStore::open(&paths).unwrap();
        prop_assert_eq!(reopened.known(), s.known());
    }
}
