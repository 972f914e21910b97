// src/verify.rs
//! Checks the last prediction against what actually came out.

use tracing::{debug, info};

use crate::data::{OutcomeRecord, Prediction, VerificationRecord, now};
use crate::error::StoreError;
use crate::store::VerificationLog;
use crate::store::verification::Tally;

/// `"Color_Size"` against an observed record. Exact color and size equality;
/// anything that does not split into exactly two parts is a miss.
pub fn verify(prediction: &str, actual: &OutcomeRecord) -> bool {
    let mut parts = prediction.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(color), Some(size), None) => color == actual.color.as_str() && size == actual.size.as_str(),
        _ => false,
    }
}

pub struct Verifier {
    log: VerificationLog,
}

impl Verifier {
    pub fn new(log: VerificationLog) -> Self {
        Self { log }
    }

    /// Append one audit row and return it. A prediction without a color/size
    /// half is recorded as an empty prediction and counts as a miss.
    pub fn record(&self, prediction: &Prediction, actual: &OutcomeRecord) -> Result<VerificationRecord, StoreError> {
        let predicted = prediction.color_size.clone().unwrap_or_default();
        let is_correct = verify(&predicted, actual);
        let rec = VerificationRecord {
            timestamp: now(),
            prediction: predicted,
            actual: actual.color_size(),
            period_id: actual.period_id.clone(),
            is_correct,
        };
        self.log.append(&rec)?;

        if let Some(n) = prediction.number {
            debug!(period = %actual.period_id, predicted = n, actual = actual.number, "number check");
        }
        info!(
            period = %actual.period_id,
            predicted = %rec.prediction,
            actual = %rec.actual,
            "{}",
            if is_correct { "prediction verified" } else { "prediction mismatch" }
        );
        Ok(rec)
    }

    pub fn tally(&self) -> Result<Tally, StoreError> {
        self.log.tally()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Color, Size};

    fn red(size: Size) -> OutcomeRecord {
        OutcomeRecord::new("P13", if size == Size::Small { 2 } else { 8 }, size, Color::Red)
    }

    #[test]
    fn truth_table() {
        assert!(verify("Red_Small", &red(Size::Small)));
        assert!(!verify("Red_Small", &red(Size::Big)));
        assert!(!verify("Green_Small", &red(Size::Small)));
        assert!(!verify("RedSmall", &red(Size::Small)));
        assert!(!verify("Red_Small_x", &red(Size::Small)));
        assert!(!verify("", &red(Size::Small)));
        assert!(!verify("red_small", &red(Size::Small)));
    }

    #[test]
    fn record_appends_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let v = Verifier::new(VerificationLog::new(dir.path().join("v.csv")));
        let p = Prediction { timestamp: now(), color_size: Some(s!("Red_Big")), number: Some(8) };
        let rec = v.record(&p, &red(Size::Big)).unwrap();
        assert!(rec.is_correct);
        assert_eq!(rec.actual, "Red_Big");
        assert_eq!(rec.period_id, "P13");

        let degraded = Prediction { timestamp: now(), color_size: None, number: Some(8) };
        assert!(!v.record(&degraded, &red(Size::Big)).unwrap().is_correct);
        assert_eq!(v.tally().unwrap().checked, 2);
    }
}
