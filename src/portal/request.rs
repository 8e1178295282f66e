//! The HTTP request, as much of it as the portal consumes.
//!
//! Only the first kilobyte of a connection is read; the request line and
//! query string are assumed to fit in that bound. The query string is
//! tokenized and percent/plus-decoded by `form_urlencoded`, and fields are
//! looked up by name, so field order and extra parameters don't matter.

use std::fmt;
use std::io::Read;

/// Read bound for one incoming request.
pub const MAX_REQUEST_BYTES: usize = 1024;

/// A parsed request: method, path, and decoded query fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    fields: Vec<(String, String)>,
}

impl Request {
    /// Parse a raw request prefix.
    ///
    /// Anything past the request line is ignored; headers and bodies are
    /// outside this server's contract.
    pub fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        let text = String::from_utf8_lossy(raw);
        let line = text.lines().next().unwrap_or("");

        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or(RequestError::Empty)?;
        let target = parts.next().ok_or(RequestError::MissingTarget)?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        let fields = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            fields,
        })
    }

    /// Read up to [`MAX_REQUEST_BYTES`] from `source` and parse.
    ///
    /// Reading stops at the header terminator, at EOF, or at the byte
    /// bound, whichever comes first.
    pub fn read_from(source: &mut impl Read) -> Result<Self, RequestError> {
        let mut buf = [0u8; MAX_REQUEST_BYTES];
        let mut filled = 0;

        while filled < buf.len() {
            let n = source.read(&mut buf[filled..]).map_err(RequestError::Io)?;
            if n == 0 {
                break;
            }
            filled += n;
            if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        Self::parse(&buf[..filled])
    }

    /// Decoded value of the first query field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Ways a request prefix can fail to parse.
#[derive(Debug)]
pub enum RequestError {
    /// Nothing readable arrived before the connection went quiet.
    Empty,
    /// A method with no request target.
    MissingTarget,
    /// The connection failed while reading.
    Io(std::io::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty request"),
            Self::MissingTarget => write!(f, "request line has no target"),
            Self::Io(e) => write!(f, "failed to read request: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}
