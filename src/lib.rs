// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub mod csv;
pub mod data;
pub mod file;
pub mod log;
pub mod model;
pub mod monitor;
pub mod pipeline;
pub mod predict;
pub mod progress;
pub mod report;
pub mod scrape;
pub mod session;
pub mod store;
pub mod verify;
