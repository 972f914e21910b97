// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the live session handle (network, render wait, reload).
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("malformed URL: {0}")]
    Url(String),
    #[error("timed out after {0:?} waiting for rows to render")]
    RenderTimeout(std::time::Duration),
    #[error("login failed: {0}")]
    Login(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whole-batch extraction failure. Single bad rows never produce this.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("session: {0}")]
    Session(#[from] SessionError),
    #[error("page structure changed: {0}")]
    Structure(String),
}

/// Why a single row was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing period id")]
    MissingPeriod,
    #[error("number not found in row")]
    MissingNumber,
    #[error("number {0:?} is not a digit 0-9")]
    BadNumber(String),
    #[error("size not found in row")]
    MissingSize,
    #[error("color cell not found in row")]
    MissingColor,
    #[error("unmapped color (background {background:?}, text {text:?})")]
    UnknownColor { background: String, text: String },
    #[error("number {number} contradicts size {size}")]
    SizeMismatch { number: u8, size: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("atomic replace of {path} failed: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("insufficient data: only {have} records available (need {need})")]
    Insufficient { have: usize, need: usize },
    #[error("training data not found at {0}; scrape some data first")]
    MissingLedger(PathBuf),
    #[error("history: {0}")]
    Store(#[from] StoreError),
    #[error("artifact {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("no valid models available")]
    NoModels,
    #[error("no history to predict from")]
    NoHistory,
    #[error("training data not found at {0}")]
    MissingLedger(PathBuf),
    #[error("storage: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Faults before monitoring starts. Always fatal.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("login: {0}")]
    Login(#[source] SessionError),
    #[error("failed to collect initial data after {attempts} attempts")]
    NoInitialData { attempts: u32 },
    #[error("initial model training failed: {0}")]
    Train(#[from] TrainError),
    #[error("storage: {0}")]
    Store(#[from] StoreError),
    #[error("cancelled before monitoring started")]
    Cancelled,
}
