// src/core/mod.rs

pub mod dom;
pub mod html;
pub mod net;
pub mod sanitize;
pub mod vischars;

pub use dom::{Element, HtmlElement, Selector};
pub use vischars::VisChars;
