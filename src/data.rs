// src/data.rs
//
// Canonical records shared by every stage of the pipeline.
//
// - OutcomeRecord: one observed draw, as written to the ledger.
// - Prediction: one logged guess for the next, unseen period.
// - VerificationRecord: one prediction checked against what actually came out.
//
// Records are plain values: once built they are only read, cloned and written.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in every text file we write.
pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FMT).to_string()
}

/// Accepts our own layout plus the fractional-second variant older logs carry.
pub fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Violet,
    Blue,
    Yellow,
    Unknown,
}

impl Color {
    pub const KNOWN: [Color; 5] = [Color::Red, Color::Green, Color::Violet, Color::Blue, Color::Yellow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Violet => "Violet",
            Color::Blue => "Blue",
            Color::Yellow => "Yellow",
            Color::Unknown => "Unknown",
        }
    }

    /// Exact, case-sensitive name lookup. Anything else is `Unknown`.
    pub fn from_name(name: &str) -> Color {
        Color::KNOWN
            .into_iter()
            .find(|c| c.as_str() == name)
            .unwrap_or(Color::Unknown)
    }

    pub fn is_known(&self) -> bool {
        *self != Color::Unknown
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Size {
    Small,
    Big,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Big => "Big",
        }
    }

    /// The game's size rule: 0-4 Small, 5-9 Big.
    pub fn for_number(n: u8) -> Size {
        if n <= 4 { Size::Small } else { Size::Big }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Small" => Ok(Size::Small),
            "Big" => Ok(Size::Big),
            other => Err(format!("unknown size {other:?}")),
        }
    }
}

/* ---------------- OutcomeRecord ---------------- */

/// One draw. Ledger columns: Period, Number, Size, Color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub period_id: String,
    pub number: u8,
    pub size: Size,
    pub color: Color,
}

impl OutcomeRecord {
    pub const HEADERS: [&'static str; 4] = ["Period", "Number", "Size", "Color"];

    pub fn new(period_id: impl Into<String>, number: u8, size: Size, color: Color) -> Self {
        Self { period_id: period_id.into(), number, size, color }
    }

    /// Joint label used by the classifier and the verifier: "Red_Small".
    pub fn color_size(&self) -> String {
        format!("{}_{}", self.color, self.size)
    }

    pub fn size_is_consistent(&self) -> bool {
        Size::for_number(self.number) == self.size
    }

    pub fn to_row(&self) -> Vec<String> {
        cells![self.period_id, self.number, self.size, self.color]
    }

    pub fn from_row(row: &[String]) -> Result<Self, String> {
        if row.len() < 4 {
            return Err(format!("expected 4 columns, got {}", row.len()));
        }
        let period_id = row[0].trim();
        if period_id.is_empty() {
            return Err(s!("empty period id"));
        }
        let number: u8 = row[1]
            .trim()
            .parse()
            .map_err(|_| format!("bad number {:?}", row[1]))?;
        if number > 9 {
            return Err(format!("number {number} out of range"));
        }
        let size: Size = row[2].trim().parse()?;
        let color = Color::from_name(row[3].trim());
        Ok(Self::new(period_id, number, size, color))
    }
}

/// Natural order for period ids: shorter ids first, then lexicographic.
/// Keeps "P2" before "P10" and plain numeric ids in numeric order.
pub fn period_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/* ---------------- Prediction ---------------- */

/// One guess for the next period. Either half may be missing when only one
/// model artifact could be loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub timestamp: NaiveDateTime,
    /// Raw classifier label, normally "Color_Size".
    pub color_size: Option<String>,
    pub number: Option<u8>,
}

impl Prediction {
    fn part(&self, i: usize) -> Option<&str> {
        let label = self.color_size.as_deref()?;
        let parts: Vec<&str> = label.split('_').collect();
        if parts.len() == 2 { Some(parts[i]) } else { None }
    }

    pub fn predicted_color(&self) -> Option<Color> {
        self.part(0).map(Color::from_name)
    }

    pub fn predicted_size(&self) -> Option<Size> {
        self.part(1).and_then(|s| s.parse().ok())
    }

    /// Log line fields: timestamp, color_size, number (absent parts are empty).
    pub fn to_row(&self) -> Vec<String> {
        vec![
            format_ts(&self.timestamp),
            self.color_size.clone().unwrap_or_default(),
            self.number.map(|n| n.to_string()).unwrap_or_default(),
        ]
    }

    pub fn from_row(row: &[String]) -> Result<Self, String> {
        if row.len() < 3 {
            return Err(format!("expected 3 fields, got {}", row.len()));
        }
        let timestamp = parse_ts(&row[0]).ok_or_else(|| format!("bad timestamp {:?}", row[0]))?;
        let label = row[1].trim();
        let color_size = if label.is_empty() { None } else { Some(s!(label)) };
        // Older logs carry the raw regressor float ("4.37").
        let number = match row[2].trim() {
            "" => None,
            n => Some(
                n.parse::<f64>()
                    .map_err(|_| format!("bad number {n:?}"))
                    .map(clamp_digit)?,
            ),
        };
        Ok(Self { timestamp, color_size, number })
    }
}

/// Round a regressor output onto the 0-9 dial.
pub fn clamp_digit(x: f64) -> u8 {
    if !x.is_finite() {
        return 0;
    }
    x.round().clamp(0.0, 9.0) as u8
}

/* ---------------- VerificationRecord ---------------- */

/// Audit row. File columns: Timestamp, Prediction, Actual, Period, Correct.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationRecord {
    pub timestamp: NaiveDateTime,
    pub prediction: String,
    pub actual: String,
    pub period_id: String,
    pub is_correct: bool,
}

impl VerificationRecord {
    pub const HEADERS: [&'static str; 5] = ["Timestamp", "Prediction", "Actual", "Period", "Correct"];

    pub fn to_row(&self) -> Vec<String> {
        cells![format_ts(&self.timestamp), self.prediction, self.actual, self.period_id, self.is_correct]
    }

    pub fn from_row(row: &[String]) -> Result<Self, String> {
        if row.len() < 3 {
            return Err(format!("expected at least 3 columns, got {}", row.len()));
        }
        let timestamp = parse_ts(&row[0]).ok_or_else(|| format!("bad timestamp {:?}", row[0]))?;
        let period_id = row.get(3).cloned().unwrap_or_default();
        let is_correct = match row.get(4).map(|s| s.trim()) {
            Some("true") => true,
            Some("false") => false,
            // Three-column rows: recompute from the stored strings.
            _ => labels_match(&row[1], &row[2]),
        };
        Ok(Self {
            timestamp,
            prediction: row[1].clone(),
            actual: row[2].clone(),
            period_id,
            is_correct,
        })
    }
}

fn labels_match(pred: &str, actual: &str) -> bool {
    let p: Vec<&str> = pred.split('_').collect();
    let a: Vec<&str> = actual.split('_').collect();
    p.len() == 2 && a.len() == 2 && p == a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_names_are_exact() {
        assert_eq!(Color::from_name("Violet"), Color::Violet);
        assert_eq!(Color::from_name("violet"), Color::Unknown);
        assert_eq!(Color::from_name(""), Color::Unknown);
    }

    #[test]
    fn size_rule_boundaries() {
        assert_eq!(Size::for_number(0), Size::Small);
        assert_eq!(Size::for_number(4), Size::Small);
        assert_eq!(Size::for_number(5), Size::Big);
        assert_eq!(Size::for_number(9), Size::Big);
    }

    #[test]
    fn record_row_rejects_out_of_range_number() {
        let row = cells!["P1", 12, "Big", "Red"];
        assert!(OutcomeRecord::from_row(&row).is_err());
    }

    #[test]
    fn period_order_is_natural() {
        let mut ids = vec!["P10", "P2", "P1"];
        ids.sort_by(|a, b| period_order(a, b));
        assert_eq!(ids, vec!["P1", "P2", "P10"]);
    }

    #[test]
    fn prediction_parts_need_exactly_two_fields() {
        let p = Prediction { timestamp: now(), color_size: Some(s!("Red_Small")), number: None };
        assert_eq!(p.predicted_color(), Some(Color::Red));
        assert_eq!(p.predicted_size(), Some(Size::Small));

        let bad = Prediction { timestamp: now(), color_size: Some(s!("RedSmall")), number: None };
        assert_eq!(bad.predicted_color(), None);
        assert_eq!(bad.predicted_size(), None);
    }

    #[test]
    fn prediction_reads_float_numbers_from_old_logs() {
        let row = cells!["2025-01-02 10:11:12.123456", "Green_Big", "6.6"];
        let p = Prediction::from_row(&row).unwrap();
        assert_eq!(p.number, Some(7));
        assert_eq!(p.color_size.as_deref(), Some("Green_Big"));
    }

    #[test]
    fn clamp_digit_stays_on_dial() {
        assert_eq!(clamp_digit(-3.0), 0);
        assert_eq!(clamp_digit(11.2), 9);
        assert_eq!(clamp_digit(f64::NAN), 0);
    }
}
