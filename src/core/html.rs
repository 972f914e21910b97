// src/core/html.rs
// Low-level HTML string helpers. Case-insensitive on ASCII tag/attribute names.
// Offsets computed on the lowercased copy are valid on the original because
// lowercasing only touches ASCII bytes.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Does `<tag` start at byte `i` of the lowercased text (and not `<tagfoo`)?
fn opens_at(lc: &str, i: usize, tag: &str) -> bool {
    let b = lc.as_bytes();
    if b.get(i) != Some(&b'<') || !lc[i + 1..].starts_with(tag) {
        return false;
    }
    matches!(
        b.get(i + 1 + tag.len()),
        Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')
    )
}

fn closes_at(lc: &str, i: usize, tag: &str) -> bool {
    let b = lc.as_bytes();
    if !lc[i..].starts_with("</") || !lc[i + 2..].starts_with(tag) {
        return false;
    }
    matches!(b.get(i + 2 + tag.len()), Some(b' ' | b'\t' | b'\r' | b'\n' | b'>'))
}

/// All `tag` elements inside `s`, at any depth, in document order (outer
/// first), as (start, end) byte offsets of the outer HTML. One pass with a
/// stack of open elements; an unclosed element runs to the end of the input
/// and a stray close tag is ignored.
pub fn elements_ci(s: &str, tag: &str) -> Vec<(usize, usize)> {
    let lc = to_lower(s);
    let tag = to_lower(tag);
    let mut out: Vec<(usize, usize)> = Vec::new();
    let mut open: Vec<usize> = Vec::new(); // indices into `out`

    let mut j = 0usize;
    while let Some(rel) = lc[j..].find('<') {
        j += rel;
        if opens_at(&lc, j, &tag) {
            let Some(gt) = s[j..].find('>') else { break };
            let open_end = j + gt + 1;
            if s[j..open_end].ends_with("/>") {
                out.push((j, open_end));
            } else {
                open.push(out.len());
                out.push((j, s.len()));
            }
            j = open_end;
        } else if closes_at(&lc, j, &tag) {
            let close_end = s[j..].find('>').map(|e| j + e + 1).unwrap_or(s.len());
            if let Some(k) = open.pop() {
                out[k].1 = close_end;
            }
            j = close_end;
        } else {
            j += 1;
        }
    }
    out
}

/// The opening tag of an element block: `<div class="x">`.
pub fn opener(block: &str) -> &str {
    match block.find('>') {
        Some(e) => &block[..=e],
        None => block,
    }
}

/// Given a complete block like `<td ...>INNER</td>`, return INNER
/// (still may contain nested tags).
pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
        return block[oe + 1..].to_string();
    }
    s!()
}

/// Value of attribute `name` in an opening tag. Double, single or no quotes.
pub fn attr_value(open_tag: &str, name: &str) -> Option<String> {
    let lc = to_lower(open_tag);
    let name = to_lower(name);
    let b = lc.as_bytes();
    let mut from = 0usize;
    while let Some(rel) = lc[from..].find(&name) {
        let at = from + rel;
        from = at + name.len();
        // must be a whole attribute name
        let before_ok = at > 0 && b[at - 1].is_ascii_whitespace();
        if !before_ok {
            continue;
        }
        let rest = lc[from..].trim_start();
        if !rest.starts_with('=') {
            continue;
        }
        let val_start = lc.len() - rest.len() + 1;
        let raw = &open_tag[val_start..];
        let raw = raw.trim_start();
        let val = match raw.as_bytes().first() {
            Some(q @ (b'"' | b'\'')) => {
                let q = *q as char;
                let body = &raw[1..];
                &body[..body.find(q).unwrap_or(body.len())]
            }
            _ => {
                let end = raw
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .unwrap_or(raw.len());
                &raw[..end]
            }
        };
        return Some(val.to_string());
    }
    None
}

/// Whitespace-separated class names of an opening tag.
pub fn class_list(open_tag: &str) -> Vec<String> {
    attr_value(open_tag, "class")
        .map(|v| v.split_whitespace().map(|c| c.to_string()).collect())
        .unwrap_or_default()
}

/// Value of one declaration inside a `style` attribute, e.g. `background-color`.
pub fn style_property(open_tag: &str, property: &str) -> Option<String> {
    let style = attr_value(open_tag, "style")?;
    let prop = to_lower(property);
    style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        if to_lower(k.trim()) == prop {
            Some(v.trim().to_string())
        } else {
            None
        }
    })
}

/// Visible text of a fragment: tags dropped, entities decoded, whitespace collapsed.
pub fn visible_text(s: &str) -> String {
    super::sanitize::normalize_ws(&super::VisChars::new(s).collect::<String>())
}
