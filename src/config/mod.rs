// src/config/mod.rs
pub mod consts;
pub mod options;

pub use options::{AppConfig, ExtractOptions, MonitorOptions, Paths, SessionOptions, SizeRule, TrainOptions};
