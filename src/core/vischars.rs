// src/core/vischars.rs
// Visible-text character iterator over an HTML fragment.
// Skips tags (<...>), decodes the handful of entities the history page uses,
// collapses ASCII whitespace runs to a single ' '.

pub struct VisChars<'a> {
    s: &'a str,
    b: &'a [u8],
    i: usize,
    n: usize,
}

impl<'a> VisChars<'a> {
    pub fn new(s: &'a str) -> Self { Self { s, b: s.as_bytes(), i: 0, n: s.len() } }

    #[inline]
    fn skip_tag(&mut self) {
        // called when current byte is '<'
        self.i += 1;
        let mut in_s = false; // '
        let mut in_d = false; // "
        while self.i < self.n {
            match self.b[self.i] {
                b'\'' if !in_d => in_s = !in_s,
                b'"'  if !in_s => in_d = !in_d,
                b'>' if !in_s && !in_d => { self.i += 1; return; }
                _ => {}
            }
            self.i += 1;
        }
    }

    /// Called on '&'. Unknown or unterminated entities come out as a space.
    #[inline]
    fn entity(&mut self) -> char {
        let start = self.i + 1;
        let mut j = start;
        while j < self.n && j - start <= 8 && self.b[j] != b';' {
            j += 1;
        }
        if j >= self.n || self.b[j] != b';' {
            self.i += 1;
            return '&';
        }
        self.i = j + 1;
        match &self.s[start..j] {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "#39" | "apos" => '\'',
            _ => ' ',
        }
    }

    #[inline]
    fn next_char(&mut self) -> Option<char> {
        let ch = self.s[self.i..].chars().next()?;
        self.i += ch.len_utf8();
        Some(ch)
    }
}

impl<'a> Iterator for VisChars<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.n {
            match self.b[self.i] {
                b'<' => { self.skip_tag(); continue; }
                b'&' => return Some(self.entity()),
                b' ' | b'\t' | b'\r' | b'\n' => {
                    while self.i < self.n {
                        match self.b[self.i] { b' ' | b'\t' | b'\r' | b'\n' => self.i += 1, _ => break }
                    }
                    return Some(' ');
                }
                _ => return self.next_char(),
            }
        }
        None
    }
}
