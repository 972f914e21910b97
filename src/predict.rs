// src/predict.rs
use tracing::{debug, info, warn};

use crate::config::Paths;
use crate::data::{OutcomeRecord, Prediction, clamp_digit, now};
use crate::error::{PredictError, TrainError};
use crate::model::{Artifact, NaiveBayes, Ridge, features_for};
use crate::store::PredictionLog;
use crate::store::history::load_records;

pub struct Predictor {
    classifier: Option<Artifact<NaiveBayes>>,
    regressor: Option<Artifact<Ridge>>,
    log: PredictionLog,
}

fn usable<M>(name: &str, loaded: Result<Artifact<M>, TrainError>) -> Option<Artifact<M>> {
    match loaded {
        Ok(a) if a.features_match() => {
            debug!(model = name, trained = %a.timestamp, "model loaded");
            Some(a)
        }
        Ok(a) => {
            warn!(model = name, features = ?a.metadata.feature_list, "model feature list does not match; ignoring");
            None
        }
        Err(e) => {
            warn!(model = name, "{name} model unavailable: {e}");
            None
        }
    }
}

impl Predictor {
    pub fn load(paths: &Paths) -> Result<Self, PredictError> {
        let classifier = usable("color_size", Artifact::load(&paths.color_size_model()));
        let regressor = usable("number", Artifact::load(&paths.number_model()));
        Self::from_parts(classifier, regressor, PredictionLog::new(paths.prediction_log()))
    }

    pub fn from_parts(
        classifier: Option<Artifact<NaiveBayes>>,
        regressor: Option<Artifact<Ridge>>,
        log: PredictionLog,
    ) -> Result<Self, PredictError> {
        if classifier.is_none() && regressor.is_none() {
            return Err(PredictError::NoModels);
        }
        Ok(Self { classifier, regressor, log })
    }

    /// Only one of the two models is in use.
    pub fn is_degraded(&self) -> bool {
        self.classifier.is_none() || self.regressor.is_none()
    }

    /// Predict the period after `latest` (`prev` is the record before it) and
    /// append the result to the prediction log.
    pub fn predict(&self, latest: &OutcomeRecord, prev: Option<&OutcomeRecord>) -> Result<Prediction, PredictError> {
        let x = features_for(latest, prev);
        let color_size = self
            .classifier
            .as_ref()
            .and_then(|a| a.model.predict(&x))
            .map(String::from);
        let number = self.regressor.as_ref().map(|a| clamp_digit(a.model.predict(&x)));

        let p = Prediction { timestamp: now(), color_size, number };
        self.log.append(&p)?;
        info!(
            after = %latest.period_id,
            color_size = p.color_size.as_deref().unwrap_or("-"),
            number = ?p.number,
            "prediction logged"
        );
        Ok(p)
    }

    /// Predict from the tail of an ordered history.
    pub fn predict_history(&self, history: &[OutcomeRecord]) -> Result<Prediction, PredictError> {
        let (latest, rest) = history.split_last().ok_or(PredictError::NoHistory)?;
        self.predict(latest, rest.last())
    }

    pub fn last_prediction(&self) -> Result<Option<Prediction>, PredictError> {
        Ok(self.log.last()?)
    }
}

/// One-off prediction from the ledger on disk, logged like any other.
pub fn predict_next(paths: &Paths) -> Result<Prediction, PredictError> {
    let ledger = paths.ledger();
    if !ledger.exists() {
        return Err(PredictError::MissingLedger(ledger));
    }
    let history = load_records(&ledger)?;
    Predictor::load(paths)?.predict_history(&history)
}
