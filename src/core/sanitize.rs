// src/core/sanitize.rs

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Lowercase and drop every whitespace char: "RGBA(255, 0, 0, 1)" → "rgba(255,0,0,1)".
pub fn compact_lower(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Strip a known period-id prefix some layouts render ("Period 2025…").
pub fn clean_period(s: &str) -> String {
    let t = normalize_ws(s);
    let lc = t.to_ascii_lowercase();
    let t = if lc.starts_with("period") { t[6..].trim_start_matches([':', ' ']).to_string() } else { t };
    t.trim().to_string()
}

/// First ASCII digit run in a cell ("7", " 7 ", "No. 7").
pub fn first_digits(s: &str) -> Option<String> {
    let mut digits = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.is_empty() { None } else { Some(digits) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compacts_css_colors() {
        assert_eq!(compact_lower(" RGBA(255, 0, 0, 1) "), "rgba(255,0,0,1)");
    }

    #[test]
    fn period_prefix_is_dropped() {
        assert_eq!(clean_period("  Period:  20250101 "), "20250101");
        assert_eq!(clean_period("20250101"), "20250101");
    }

    #[test]
    fn digits_first_run() {
        assert_eq!(first_digits(" No. 7 x 9").as_deref(), Some("7"));
        assert_eq!(first_digits("Big"), None);
    }
}
