// src/core/net.rs
// HTTP/1.0 GET over TCP (std-only). HTTP/1.0 so the server closes the
// connection at the end and never sends a chunked body.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::consts::USER_AGENT;
use crate::error::SessionError;

/// `http://host[:port]/path?query` split into what the request line needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Url {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Url {
    pub fn parse(url: &str) -> Result<Url, SessionError> {
        let rest = url
            .trim()
            .strip_prefix("http://")
            .ok_or_else(|| SessionError::Url(format!("{url} (only plain http:// is supported)")))?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((h, p)) => {
                let port = p.parse().map_err(|_| SessionError::Url(format!("{url} (bad port)")))?;
                (h, port)
            }
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(SessionError::Url(format!("{url} (missing host)")));
        }
        Ok(Url { host: s!(host), port, path: s!(path) })
    }
}

pub fn http_get(url: &Url, timeout: Duration) -> Result<String, SessionError> {
    let mut s = TcpStream::connect((url.host.as_str(), url.port)).map_err(|source| {
        SessionError::Connect { host: url.host.clone(), port: url.port, source }
    })?;
    s.set_read_timeout(Some(timeout))?;
    s.set_write_timeout(Some(timeout))?;

    let req = format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nUser-Agent: {}\r\nConnection: close\r\n\r\n",
        url.path, url.host, USER_AGENT
    );
    s.write_all(req.as_bytes())?;
    s.flush()?;

    let mut buf = Vec::new();
    s.read_to_end(&mut buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => SessionError::RenderTimeout(timeout),
        _ => SessionError::Io(e),
    })?;
    split_response(&String::from_utf8_lossy(&buf))
}

/// Status check + body split, separate from the socket for tests.
pub fn split_response(resp: &str) -> Result<String, SessionError> {
    let status = resp.split("\r\n").next().unwrap_or("");
    let code = status.split_whitespace().nth(1).unwrap_or("");
    if code != "200" {
        return Err(SessionError::Http(s!(status)));
    }
    let body_idx = resp
        .find("\r\n\r\n")
        .ok_or_else(|| SessionError::Http(s!("malformed HTTP response")))?
        + 4;
    Ok(resp[body_idx..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls() {
        let u = Url::parse("http://example.com:8080/game/history?x=1").unwrap();
        assert_eq!(u, Url { host: s!("example.com"), port: 8080, path: s!("/game/history?x=1") });
        let u = Url::parse("http://example.com").unwrap();
        assert_eq!((u.port, u.path.as_str()), (80, "/"));
        assert!(Url::parse("https://example.com").is_err());
        assert!(Url::parse("http://:80/").is_err());
    }

    #[test]
    fn non_200_is_an_error() {
        assert!(split_response("HTTP/1.0 404 Not Found\r\n\r\nnope").is_err());
        let body = split_response("HTTP/1.0 200 OK\r\nX: y\r\n\r\n<div>ok</div>").unwrap();
        assert_eq!(body, "<div>ok</div>");
    }
}
