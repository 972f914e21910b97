// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant). Blank lines are dropped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row without newline (a crash mid-append can leave one).
    row.push(field);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }

    rows
}

/// Split off the first row when it equals `expected` (case-insensitive).
pub fn split_header<'a>(rows: &'a [Vec<String>], expected: &[&str]) -> (bool, &'a [Vec<String>]) {
    match rows.first() {
        Some(first)
            if first.len() >= expected.len()
                && first.iter().zip(expected).all(|(a, b)| a.trim().eq_ignore_ascii_case(b)) =>
        {
            (true, &rows[1..])
        }
        _ => (false, rows),
    }
}

/* ---------------- Decoding ---------------- */

/// A data row that did not decode. `line` is 1-based and counts the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BadRow {
    pub line: usize,
    pub reason: String,
}

/// Parse a store file and decode each data row with `decode`. A first row that
/// matches `header` is skipped. Rows that fail come back in the second vec.
pub fn decode_rows<T, F>(text: &str, sep: char, header: Option<&[&str]>, mut decode: F) -> (Vec<T>, Vec<BadRow>)
where
    F: FnMut(&[String]) -> Result<T, String>,
{
    let rows = parse_rows(text, sep);
    let (had_header, body) = match header {
        Some(h) => split_header(&rows, h),
        None => (false, &rows[..]),
    };
    let first_line = if had_header { 2 } else { 1 };

    let mut good = Vec::with_capacity(body.len());
    let mut bad = Vec::new();
    for (i, row) in body.iter().enumerate() {
        match decode(row) {
            Ok(v) => good.push(v),
            Err(reason) => bad.push(BadRow { line: i + first_line, reason }),
        }
    }
    (good, bad)
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        let cell = cell.as_ref();
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
