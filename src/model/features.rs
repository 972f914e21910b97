// src/model/features.rs
use crate::data::{Color, OutcomeRecord, Size};

/// Column names, in vector order. Persisted with every artifact and checked
/// again on load.
pub const FEATURES: [&str; 5] = ["ColorCode", "SizeCode", "EvenOdd", "PrevColor", "PrevSize"];

pub type FeatureVec = [i8; 5];

/// Category code for anything unmapped (and for "no previous record").
pub const UNKNOWN: i8 = -1;

pub fn color_code(c: Color) -> i8 {
    match c {
        Color::Red => 0,
        Color::Green => 1,
        Color::Violet => 2,
        Color::Blue => 3,
        Color::Yellow => 4,
        Color::Unknown => UNKNOWN,
    }
}

pub fn size_code(s: Size) -> i8 {
    match s {
        Size::Small => 0,
        Size::Big => 1,
    }
}

/// Features describing `rec`, with `prev` the record right before it.
pub fn features_for(rec: &OutcomeRecord, prev: Option<&OutcomeRecord>) -> FeatureVec {
    [
        color_code(rec.color),
        size_code(rec.size),
        (rec.number % 2) as i8,
        prev.map_or(UNKNOWN, |p| color_code(p.color)),
        prev.map_or(UNKNOWN, |p| size_code(p.size)),
    ]
}

/// True when a persisted feature list is exactly ours.
pub fn matches_feature_list(list: &[String]) -> bool {
    list.len() == FEATURES.len() && list.iter().zip(FEATURES).all(|(a, b)| a == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_has_no_previous() {
        let r = OutcomeRecord::new("P1", 7, Size::Big, Color::Violet);
        assert_eq!(features_for(&r, None), [2, 1, 1, -1, -1]);
    }

    #[test]
    fn previous_record_fills_prev_columns() {
        let p = OutcomeRecord::new("P1", 2, Size::Small, Color::Yellow);
        let r = OutcomeRecord::new("P2", 4, Size::Small, Color::Unknown);
        assert_eq!(features_for(&r, Some(&p)), [-1, 0, 0, 4, 0]);
    }

    #[test]
    fn feature_list_must_match_exactly() {
        let ours: Vec<String> = FEATURES.iter().map(|s| s.to_string()).collect();
        assert!(matches_feature_list(&ours));
        assert!(!matches_feature_list(&ours[..2]));
        let mut swapped = ours.clone();
        swapped.swap(0, 1);
        assert!(!matches_feature_list(&swapped));
    }
}
