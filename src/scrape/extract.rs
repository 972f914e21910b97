// src/scrape/extract.rs
// One OutcomeRecord per `div.van-row`:
//   div.van-col--10            period id
//   div.van-col--5.numcenter   number (else first div.van-col--5)
//   div.van-col--5             "Big" / "Small"
//   div.van-col--4             background-color, else color name text
// Bad rows are skipped with a warning.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::{ExtractOptions, SizeRule};
use crate::core::dom::{Element, Selector, TRANSPARENT};
use crate::core::sanitize::{clean_period, compact_lower, first_digits};
use crate::data::{Color, OutcomeRecord, Size};
use crate::error::{ExtractError, RowError};
use crate::session::Session;

pub const PERIOD_CELL: &str = "div.van-col.van-col--10";
pub const NUMBER_CELL: &str = "div.van-col.van-col--5.numcenter";
pub const FIVE_CELL: &str = "div.van-col.van-col--5";
pub const COLOR_CELL: &str = "div.van-col.van-col--4";

/// Background prefixes as the browser reports them (compacted, lowercase).
const RGBA_COLORS: [(&str, Color); 5] = [
    ("rgba(255,0,0,", Color::Red),
    ("rgba(0,128,0,", Color::Green),
    ("rgba(148,0,211,", Color::Violet),
    ("rgba(0,0,255,", Color::Blue),
    ("rgba(255,255,0,", Color::Yellow),
];

/// Compiled selectors, built once per extractor.
struct Cells {
    period: Selector,
    number: Selector,
    five: Selector,
    color: Selector,
}

impl Cells {
    fn new() -> Self {
        Self {
            period: Selector::parse(PERIOD_CELL),
            number: Selector::parse(NUMBER_CELL),
            five: Selector::parse(FIVE_CELL),
            color: Selector::parse(COLOR_CELL),
        }
    }
}

pub struct Extractor {
    cells: Cells,
    opts: ExtractOptions,
}

/// What one batch produced: the good records plus why the others were dropped.
#[derive(Debug, Default)]
pub struct Batch {
    pub records: Vec<OutcomeRecord>,
    pub skipped: Vec<(usize, RowError)>,
}

impl Extractor {
    pub fn new(opts: ExtractOptions) -> Self {
        Self { cells: Cells::new(), opts }
    }

    /// Pull the current rows from the session and parse them.
    pub fn extract<S: Session>(
        &self,
        session: &mut S,
        timeout: std::time::Duration,
    ) -> Result<Vec<OutcomeRecord>, ExtractError> {
        let rows = session.rows(timeout)?;
        debug!(rows = rows.len(), "found history rows");
        Ok(self.parse_rows(&rows)?.records)
    }

    /// Parse already-fetched rows. Only fails when the page as a whole no
    /// longer looks like the history table.
    pub fn parse_rows<E: Element>(&self, rows: &[E]) -> Result<Batch, ExtractError> {
        let t = Instant::now();
        let mut batch = Batch::default();

        for (i, row) in rows.iter().enumerate() {
            match self.parse_row(row) {
                Ok(rec) => batch.records.push(rec),
                Err(e) => {
                    warn!(row = i, "skipping malformed row: {e}");
                    batch.skipped.push((i, e));
                }
            }
        }

        // Rows present but not one of them has a period cell: the markup moved.
        if !rows.is_empty()
            && batch.records.is_empty()
            && batch.skipped.iter().all(|(_, e)| *e == RowError::MissingPeriod)
        {
            return Err(ExtractError::Structure(format!(
                "{} rows, none with a {PERIOD_CELL} cell",
                rows.len()
            )));
        }

        debug!(
            kept = batch.records.len(),
            skipped = batch.skipped.len(),
            elapsed = ?t.elapsed(),
            "parsed rows"
        );
        Ok(batch)
    }

    pub fn parse_row<E: Element>(&self, row: &E) -> Result<OutcomeRecord, RowError> {
        let c = &self.cells;

        let period = row
            .find(&c.period)
            .map(|e| clean_period(&e.text()))
            .filter(|p| !p.is_empty())
            .ok_or(RowError::MissingPeriod)?;

        let fives = row.find_all(&c.five);

        let number_text = match row.find(&c.number) {
            Some(cell) => cell.text(),
            None => fives.first().map(|cell| cell.text()).ok_or(RowError::MissingNumber)?,
        };
        let number = first_digits(&number_text)
            .and_then(|d| d.parse::<u8>().ok())
            .filter(|n| *n <= 9)
            .ok_or(RowError::BadNumber(number_text))?;

        let size = fives
            .iter()
            .find_map(|cell| size_from_text(&cell.text()))
            .ok_or(RowError::MissingSize)?;

        let color_cell = row.find(&c.color).ok_or(RowError::MissingColor)?;
        let background = color_cell.css_value("background-color");
        let text = color_cell.text();
        let color = resolve_color(&background, &text);
        if !color.is_known() {
            return Err(RowError::UnknownColor { background, text });
        }

        let rec = OutcomeRecord::new(period, number, size, color);
        if !rec.size_is_consistent() {
            match self.opts.size_rule {
                SizeRule::Ignore => {}
                SizeRule::Warn => warn!(
                    period = %rec.period_id,
                    "number {} with size {} breaks the 0-4 Small / 5-9 Big rule",
                    rec.number, rec.size
                ),
                SizeRule::Enforce => {
                    return Err(RowError::SizeMismatch { number, size: s!(size.as_str()) });
                }
            }
        }
        Ok(rec)
    }
}

fn size_from_text(text: &str) -> Option<Size> {
    if text.contains("Big") {
        Some(Size::Big)
    } else if text.contains("Small") {
        Some(Size::Small)
    } else {
        None
    }
}

/// `rgb(r, g, b)` → `rgba(r,g,b,1)`, everything compacted and lowercased.
fn normalize_css_color(css: &str) -> String {
    let c = compact_lower(css);
    match c.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
        Some(body) => format!("rgba({body},1)"),
        None => c,
    }
}

fn is_transparent(css: &str) -> bool {
    let c = normalize_css_color(css);
    c.is_empty() || c == "transparent" || c == compact_lower(TRANSPARENT)
}

/// Map a background value to a color name.
pub fn rgba_to_color(css: &str) -> Color {
    let c = normalize_css_color(css);
    RGBA_COLORS
        .iter()
        .find(|(prefix, _)| c.starts_with(prefix))
        .map(|(_, color)| *color)
        .unwrap_or(Color::Unknown)
}

/// Background first; literal color text only when the background is transparent.
pub fn resolve_color(background: &str, text: &str) -> Color {
    if is_transparent(background) {
        Color::from_name(text.trim())
    } else {
        rgba_to_color(background)
    }
}
