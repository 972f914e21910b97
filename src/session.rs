// src/session.rs
// Session seam: hands over rendered history rows and reloads the page.
// A page without the `div.record` container counts as a render timeout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::SessionOptions;
use crate::core::dom::{Element, HtmlElement, Selector};
use crate::core::net::{self, Url};
use crate::error::SessionError;

pub const RECORD_CONTAINER: &str = "div.record";
pub const ROW_SELECTOR: &str = "div.van-row";

pub trait Session {
    type Row: Element;

    /// Confirm the session is usable. Called once before collection starts.
    fn login(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    /// Rendered history rows, newest first as the page shows them.
    fn rows(&mut self, timeout: Duration) -> Result<Vec<Self::Row>, SessionError>;

    /// Force the page to reload.
    fn reload(&mut self) -> Result<(), SessionError>;

    /// Write whatever best describes the current page to `path` (diagnostics).
    fn capture(&mut self, path: &Path) -> Result<(), SessionError>;
}

/// Rows of a rendered document, or a render timeout when the container is absent.
pub fn rows_from_document(doc: &str, timeout: Duration) -> Result<Vec<HtmlElement>, SessionError> {
    let container = Selector::parse(RECORD_CONTAINER);
    let containers = HtmlElement::select(doc, &container);
    if containers.is_empty() {
        return Err(SessionError::RenderTimeout(timeout));
    }
    let row_sel = Selector::parse(ROW_SELECTOR);
    Ok(containers.iter().flat_map(|c| c.find_all(&row_sel)).collect())
}

/* ---------------- HTTP ---------------- */

pub struct HttpSession {
    url: Url,
    timeout: Duration,
    page: Option<String>,
}

impl HttpSession {
    pub fn new(opts: &SessionOptions) -> Result<Self, SessionError> {
        Ok(Self { url: Url::parse(&opts.url)?, timeout: opts.render_timeout(), page: None })
    }

    fn fetch(&mut self, timeout: Duration) -> Result<&str, SessionError> {
        let t = std::time::Instant::now();
        let body = net::http_get(&self.url, timeout)?;
        debug!(bytes = body.len(), elapsed = ?t.elapsed(), "fetched {}", self.url.path);
        let page: &str = self.page.insert(body);
        Ok(page)
    }
}

impl Session for HttpSession {
    type Row = HtmlElement;

    fn login(&mut self) -> Result<(), SessionError> {
        let timeout = self.timeout;
        let doc = self
            .fetch(timeout)
            .map_err(|e| SessionError::Login(e.to_string()))?;
        let rows = rows_from_document(doc, timeout).map_err(|e| SessionError::Login(e.to_string()))?;
        info!(host = %self.url.host, rows = rows.len(), "session ready");
        Ok(())
    }

    fn rows(&mut self, timeout: Duration) -> Result<Vec<HtmlElement>, SessionError> {
        // Each poll is a fresh GET; there is no live DOM to go stale.
        let doc = self.fetch(timeout)?;
        rows_from_document(doc, timeout)
    }

    fn reload(&mut self) -> Result<(), SessionError> {
        self.page = None;
        let timeout = self.timeout;
        self.fetch(timeout).map(|_| ())
    }

    fn capture(&mut self, path: &Path) -> Result<(), SessionError> {
        let page = self.page.as_deref().unwrap_or("");
        fs::write(path, page)?;
        Ok(())
    }
}

/* ---------------- Snapshot replay ---------------- */

pub struct SnapshotSession {
    path: PathBuf,
    page: String,
}

impl SnapshotSession {
    pub fn open(path: &Path) -> Result<Self, SessionError> {
        let page = fs::read_to_string(path)?;
        Ok(Self { path: path.to_path_buf(), page })
    }
}

impl Session for SnapshotSession {
    type Row = HtmlElement;

    fn login(&mut self) -> Result<(), SessionError> {
        rows_from_document(&self.page, Duration::ZERO)
            .map(|_| ())
            .map_err(|e| SessionError::Login(format!("{}: {e}", self.path.display())))
    }

    fn rows(&mut self, timeout: Duration) -> Result<Vec<HtmlElement>, SessionError> {
        rows_from_document(&self.page, timeout)
    }

    fn reload(&mut self) -> Result<(), SessionError> {
        self.page = fs::read_to_string(&self.path)?;
        Ok(())
    }

    fn capture(&mut self, path: &Path) -> Result<(), SessionError> {
        fs::write(path, &self.page)?;
        Ok(())
    }
}

/// Session chosen by configuration: snapshot replay when a file is given.
pub enum AnySession {
    Http(HttpSession),
    Snapshot(SnapshotSession),
}

impl AnySession {
    pub fn from_options(opts: &SessionOptions) -> Result<Self, SessionError> {
        match &opts.snapshot {
            Some(p) => Ok(AnySession::Snapshot(SnapshotSession::open(p)?)),
            None => Ok(AnySession::Http(HttpSession::new(opts)?)),
        }
    }
}

impl Session for AnySession {
    type Row = HtmlElement;

    fn login(&mut self) -> Result<(), SessionError> {
        match self {
            AnySession::Http(s) => s.login(),
            AnySession::Snapshot(s) => s.login(),
        }
    }

    fn rows(&mut self, timeout: Duration) -> Result<Vec<HtmlElement>, SessionError> {
        match self {
            AnySession::Http(s) => s.rows(timeout),
            AnySession::Snapshot(s) => s.rows(timeout),
        }
    }

    fn reload(&mut self) -> Result<(), SessionError> {
        match self {
            AnySession::Http(s) => s.reload(),
            AnySession::Snapshot(s) => s.reload(),
        }
    }

    fn capture(&mut self, path: &Path) -> Result<(), SessionError> {
        match self {
            AnySession::Http(s) => s.capture(path),
            AnySession::Snapshot(s) => s.capture(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_container_is_a_timeout() {
        let err = rows_from_document("<html><body>maintenance</body></html>", Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, SessionError::RenderTimeout(_)));
    }

    #[test]
    fn rows_are_found_inside_container() {
        let doc = r#"<div class="record"><div class="van-row"><div class="van-col van-col--10">P1</div></div><div class="van-row"></div></div>"#;
        assert_eq!(rows_from_document(doc, Duration::ZERO).unwrap().len(), 2);
    }

    #[test]
    fn snapshot_reload_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("page.html");
        fs::write(&p, r#"<div class="record"></div>"#).unwrap();
        let mut s = SnapshotSession::open(&p).unwrap();
        assert!(s.rows(Duration::ZERO).unwrap().is_empty());

        fs::write(&p, r#"<div class="record"><div class="van-row"></div></div>"#).unwrap();
        s.reload().unwrap();
        assert_eq!(s.rows(Duration::ZERO).unwrap().len(), 1);
    }
}
