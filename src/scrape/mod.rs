// src/scrape/mod.rs
pub mod extract;

pub use extract::{Batch, Extractor, resolve_color, rgba_to_color};
