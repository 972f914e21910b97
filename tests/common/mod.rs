// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use bdg_predict::core::HtmlElement;
use bdg_predict::data::{Color, Size};
use bdg_predict::error::SessionError;
use bdg_predict::session::{Session, rows_from_document};

pub fn css(color: Color) -> &'static str {
    match color {
        Color::Red => "rgba(255, 0, 0, 1)",
        Color::Green => "rgba(0, 128, 0, 1)",
        Color::Violet => "rgba(148, 0, 211, 1)",
        Color::Blue => "rgba(0, 0, 255, 1)",
        Color::Yellow => "rgba(255, 255, 0, 1)",
        Color::Unknown => "rgba(1, 2, 3, 1)",
    }
}

pub fn row(period: &str, number: u8, color: Color) -> String {
    let size = Size::for_number(number);
    format!(
        r#"<div class="van-row">
  <div class="van-col van-col--10">{period}</div>
  <div class="van-col van-col--5 numcenter">{number}</div>
  <div class="van-col van-col--5"><span>{size}</span></div>
  <div class="van-col van-col--4" style="background-color: {}"></div>
</div>"#,
        css(color)
    )
}

/// Page listing `rows` as given (callers pass newest first).
pub fn page(rows: &[String]) -> String {
    format!(
        r#"<html><body><div class="header">History</div><div class="record">{}</div></body></html>"#,
        rows.concat()
    )
}

/// Periods `P{from}..=P{to}` newest first, colors cycling.
pub fn history_page(from: usize, to: usize) -> String {
    let rows: Vec<String> = (from..=to)
        .rev()
        .map(|i| row(&format!("P{i}"), (i * 3 % 10) as u8, Color::KNOWN[i % Color::KNOWN.len()]))
        .collect();
    page(&rows)
}

/// Serves one scripted document per `rows()` call; the last one repeats.
/// `None` entries simulate a page that never rendered.
pub struct ScriptedSession {
    pages: VecDeque<Option<String>>,
    last: Option<String>,
    pub reloads: usize,
    pub polls: usize,
}

impl ScriptedSession {
    pub fn new(pages: Vec<Option<String>>) -> Self {
        Self { pages: pages.into(), last: None, reloads: 0, polls: 0 }
    }
}

impl Session for ScriptedSession {
    type Row = HtmlElement;

    fn rows(&mut self, timeout: Duration) -> Result<Vec<HtmlElement>, SessionError> {
        self.polls += 1;
        if let Some(next) = self.pages.pop_front() {
            self.last = next;
        }
        match &self.last {
            Some(doc) => rows_from_document(doc, timeout),
            None => Err(SessionError::RenderTimeout(timeout)),
        }
    }

    fn reload(&mut self) -> Result<(), SessionError> {
        self.reloads += 1;
        Ok(())
    }

    fn capture(&mut self, path: &Path) -> Result<(), SessionError> {
        std::fs::write(path, self.last.as_deref().unwrap_or(""))?;
        Ok(())
    }
}
