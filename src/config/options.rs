// src/config/options.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::error::ConfigError;

/// Everything a component needs to know about its surroundings.
/// Built once in the binary and handed down; nothing reads ambient globals.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: Paths,
    pub session: SessionOptions,
    pub monitor: MonitorOptions,
    pub train: TrainOptions,
    pub extract: ExtractOptions,
}

impl AppConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let cfg: AppConfig = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// All storage rooted under one directory (tests, sandboxes).
    pub fn rooted_at(root: &Path) -> Self {
        Self { paths: Paths::rooted_at(root), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.train.test_fraction) {
            return Err(ConfigError::Invalid(format!(
                "train.test_fraction must be in [0, 1), got {}",
                self.train.test_fraction
            )));
        }
        if self.train.min_records < 2 {
            return Err(ConfigError::Invalid(s!("train.min_records must be at least 2")));
        }
        if self.monitor.max_retries == 0 {
            return Err(ConfigError::Invalid(s!("monitor.max_retries must be at least 1")));
        }
        Ok(())
    }
}

/* ---------------- Paths ---------------- */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DATA_DIR),
            model_dir: PathBuf::from(MODEL_DIR),
            logs_dir: PathBuf::from(LOGS_DIR),
        }
    }
}

impl Paths {
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            data_dir: root.join(DATA_DIR),
            model_dir: root.join(MODEL_DIR),
            logs_dir: root.join(LOGS_DIR),
        }
    }

    pub fn ledger(&self) -> PathBuf { self.data_dir.join(LEDGER_FILE) }
    pub fn known_periods(&self) -> PathBuf { self.data_dir.join(KNOWN_PERIODS_FILE) }
    pub fn verification(&self) -> PathBuf { self.data_dir.join(VERIFICATION_FILE) }
    pub fn prediction_log(&self) -> PathBuf { self.data_dir.join(PREDICTION_LOG_FILE) }
    pub fn color_size_model(&self) -> PathBuf { self.model_dir.join(COLOR_SIZE_MODEL_FILE) }
    pub fn number_model(&self) -> PathBuf { self.model_dir.join(NUMBER_MODEL_FILE) }
    pub fn error_log(&self) -> PathBuf { self.logs_dir.join(ERROR_LOG_FILE) }

    /// Create data/, model/ and logs/ if missing.
    pub fn ensure_dirs(&self) -> Result<(), Box<dyn std::error::Error>> {
        for dir in [&self.data_dir, &self.model_dir, &self.logs_dir] {
            crate::file::ensure_directory(dir)?;
        }
        Ok(())
    }
}

/* ---------------- Session ---------------- */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Page serving the rendered game history.
    pub url: String,
    /// Replay a saved page instead of fetching `url`.
    pub snapshot: Option<PathBuf>,
    pub render_timeout_secs: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            url: s!(DEFAULT_URL),
            snapshot: None,
            render_timeout_secs: RENDER_TIMEOUT_SECS,
        }
    }
}

impl SessionOptions {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

/* ---------------- Monitor ---------------- */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorOptions {
    pub interval_secs: u64,
    /// Force a reload every N cycles (0 = never).
    pub refresh_every: u32,
    /// Consecutive empty cycles before a forced reload.
    pub max_retries: u32,
    /// Pause after an empty or failed cycle. Unset means `interval_secs`.
    pub backoff_secs: Option<u64>,
    pub reload_settle_secs: u64,
    /// Retrain after this many new records (0 = never).
    pub retrain_every: usize,
    /// Stop after N cycles (0 = run until interrupted).
    pub max_cycles: u64,

    pub initial_attempts: u32,
    pub initial_pause_secs: u64,
    pub min_initial_records: usize,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval_secs: POLL_INTERVAL_SECS,
            refresh_every: REFRESH_EVERY,
            max_retries: MAX_RETRIES,
            backoff_secs: None,
            reload_settle_secs: RELOAD_SETTLE_SECS,
            retrain_every: RETRAIN_EVERY,
            max_cycles: 0,
            initial_attempts: INITIAL_ATTEMPTS,
            initial_pause_secs: INITIAL_PAUSE_SECS,
            min_initial_records: MIN_INITIAL_RECORDS,
        }
    }
}

impl MonitorOptions {
    pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }
    pub fn backoff(&self) -> Duration { Duration::from_secs(self.backoff_secs.unwrap_or(self.interval_secs)) }
    pub fn reload_settle(&self) -> Duration { Duration::from_secs(self.reload_settle_secs) }
    pub fn initial_pause(&self) -> Duration { Duration::from_secs(self.initial_pause_secs) }
}

/* ---------------- Training ---------------- */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub min_records: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            min_records: MIN_TRAIN_RECORDS,
            test_fraction: TEST_FRACTION,
            seed: SPLIT_SEED,
        }
    }
}

/* ---------------- Extraction ---------------- */

/// What to do when a row's size contradicts its number (0-4 Small, 5-9 Big).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeRule {
    Ignore,
    #[default]
    Warn,
    Enforce,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub size_rule: SizeRule,
}
