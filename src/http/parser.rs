use crate::http::headers::HeaderMap;
use crate::http::request::{split_target, Method, Request};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),
}

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Parses a complete request buffer.
///
/// The head runs up to the first blank line; everything after it is the
/// body, byte for byte. A buffer without a blank line is treated as a head
/// with no body.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    let (head_bytes, body_bytes) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + HEAD_TERMINATOR.len()..]),
        None => (buf, &[][..]),
    };

    let head = std::str::from_utf8(head_bytes).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let (method, target, version) = parse_request_line(request_line)?;
    let (path, query) = split_target(target);

    // Headers
    let mut headers = HeaderMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        match line.split_once(": ") {
            Some((key, value)) => {
                headers.insert(key.to_ascii_lowercase(), value);
            }
            None => {
                tracing::debug!(line = %line, "Skipping malformed header line");
            }
        }
    }

    Ok(Request {
        method: Method::from_token(method),
        path,
        query,
        version: version.to_string(),
        headers,
        body: body_bytes.to_vec(),
    })
}

/// How much of a request has arrived in a read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// More bytes are needed.
    Incomplete,
    /// A whole request of this many bytes is buffered.
    Complete(usize),
    /// The request announces more than the allowed number of bytes.
    TooLarge,
}

/// Checks whether `buf` holds a whole request of at most `max_len` bytes.
///
/// A request is complete once the blank line ending its head has been seen
/// and as many body bytes as its `Content-Length` announces are buffered.
/// Without a `Content-Length` the request ends at the blank line.
pub fn request_frame(buf: &[u8], max_len: usize) -> Frame {
    let Some(headers_end) = find_headers_end(buf) else {
        return Frame::Incomplete;
    };
    let body_start = headers_end + HEAD_TERMINATOR.len();

    // Let the parser report the encoding error.
    let Ok(head) = std::str::from_utf8(&buf[..headers_end]) else {
        return Frame::Complete(buf.len());
    };

    let declared = declared_content_length(head).unwrap_or(0);
    match body_start.checked_add(declared) {
        Some(total) if total > max_len => Frame::TooLarge,
        Some(total) if buf.len() >= total => Frame::Complete(total),
        Some(_) => Frame::Incomplete,
        None => Frame::TooLarge,
    }
}

fn parse_request_line(line: &str) -> Result<(&str, &str, &str), ParseError> {
    let mut parts = line.split(' ');

    // Extra tokens are rejected too: a target can never contain a space.
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version), None)
            if !method.is_empty() && !target.is_empty() && !version.is_empty() =>
        {
            Ok((method, target, version))
        }
        _ => Err(ParseError::InvalidRequestLine(line.to_string())),
    }
}

/// `Content-Length` as the header parser would see it: same `": "` split.
fn declared_content_length(head: &str) -> Option<usize> {
    head.split("\r\n").skip(1).find_map(|line| {
        let (key, value) = line.split_once(": ")?;
        if key.eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}
