//! Content negotiation for response bodies.
//!
//! The server recognizes `gzip`, `deflate` and `br` in `Accept-Encoding`, but
//! only gzip is ever applied. A client that lists only `deflate` or `br`
//! gets an uncompressed body.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

/// A content coding the server knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Deflate,
    Brotli,
}

impl ContentCoding {
    /// Matches a coding token, ignoring ASCII case.
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("gzip") {
            Some(ContentCoding::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(ContentCoding::Deflate)
        } else if token.eq_ignore_ascii_case("br") {
            Some(ContentCoding::Brotli)
        } else {
            None
        }
    }

    /// The token written into `Content-Encoding`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCoding::Gzip => "gzip",
            ContentCoding::Deflate => "deflate",
            ContentCoding::Brotli => "br",
        }
    }

    /// Whether the server can actually produce this coding.
    pub fn is_applied(&self) -> bool {
        matches!(self, ContentCoding::Gzip)
    }

    /// Compresses `body` with this coding.
    pub fn encode(&self, body: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            ContentCoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("content coding {} is not supported", other.as_str()),
            )),
        }
    }
}

/// Picks the first coding in the client's list that the server applies.
///
/// Tokens are comma separated and may carry parameters; a `q=0` parameter
/// marks the token as unacceptable. Returns `None` when nothing overlaps or
/// the header is absent.
pub fn negotiate(accept_encoding: Option<&str>) -> Option<ContentCoding> {
    accept_encoding?
        .split(',')
        .filter_map(|entry| {
            let mut params = entry.split(';').map(str::trim);
            let name = params.next()?;
            if params.any(is_zero_quality) {
                return None;
            }
            ContentCoding::from_token(name)
        })
        .find(ContentCoding::is_applied)
}

fn is_zero_quality(param: &str) -> bool {
    match param.split_once('=') {
        Some((key, value)) if key.trim().eq_ignore_ascii_case("q") => value
            .trim()
            .parse::<f32>()
            .map(|q| q <= 0.0)
            .unwrap_or(false),
        _ => false,
    }
}
