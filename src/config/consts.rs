// src/config/consts.rs

// Session
pub const DEFAULT_URL: &str = "http://localhost:8080/history";
pub const RENDER_TIMEOUT_SECS: u64 = 20;
pub const USER_AGENT: &str = "bdg_predict/0.2";

// Local storage
pub const DATA_DIR: &str = "data";
pub const MODEL_DIR: &str = "model";
pub const LOGS_DIR: &str = "logs";

pub const LEDGER_FILE: &str = "bdg_data.csv";
pub const KNOWN_PERIODS_FILE: &str = "known_periods.txt";
pub const VERIFICATION_FILE: &str = "verification.csv";
pub const PREDICTION_LOG_FILE: &str = "prediction_log.txt";
pub const COLOR_SIZE_MODEL_FILE: &str = "color_size_model.json";
pub const NUMBER_MODEL_FILE: &str = "number_model.json";
pub const LOG_FILE_PREFIX: &str = "bdg_predict.log";
pub const ERROR_LOG_FILE: &str = "error_log.txt";
pub const STORE_SEP: char = ',';

// Monitor
pub const POLL_INTERVAL_SECS: u64 = 60;
pub const REFRESH_EVERY: u32 = 5;
pub const MAX_RETRIES: u32 = 3;
pub const RELOAD_SETTLE_SECS: u64 = 3;
pub const RETRAIN_EVERY: usize = 10;
pub const SLEEP_SLICE_MS: u64 = 250;

// Initial collection
pub const INITIAL_ATTEMPTS: u32 = 5;
pub const INITIAL_PAUSE_SECS: u64 = 5;
pub const MIN_INITIAL_RECORDS: usize = 5;

// Training
pub const MIN_TRAIN_RECORDS: usize = 10;
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;
