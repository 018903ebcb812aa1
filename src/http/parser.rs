//! Start-line and header-block codec.
//!
//! Parses the head of incoming messages from a buffered reader. The server
//! side splits each header value on commas into separate stored values; the
//! client side stores each value as-is (a `Set-Cookie` expiry date contains
//! commas).

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use url::Url;

use crate::http::error::Error;
use crate::http::headers::Headers;
use crate::http::{Method, Version};

/// Parsed request line and header block, before any body transport.
#[derive(Debug)]
pub struct RequestHead {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub version: Version,
    pub headers: Headers,
}

/// Parsed status line and header block of a response.
#[derive(Debug)]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub headers: Headers,
}

/// Reads one CRLF-terminated line, without the terminator.
///
/// Returns `None` on a clean end of stream.
pub(crate) async fn read_head_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Parses a request head from the connection.
///
/// The method gate and version gate of the server live here: unrecognized
/// or non-routable method names fail with [`Error::InvalidMethod`], versions
/// other than 1.0/1.1 with [`Error::VersionNotSupported`]. A request without
/// a `Host` header is rejected as a bad request.
pub async fn parse_request_head<R>(reader: &mut R) -> Result<RequestHead, Error>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = match read_head_line(reader).await? {
        Some(line) => line,
        None => return Err(Error::ConnectionClosed),
    };

    let parts: Vec<&str> = request_line.split(' ').collect();
    if parts.len() != 3 {
        return Err(Error::BadRequest);
    }

    let method = Method::from_token(parts[0]).ok_or(Error::InvalidMethod)?;
    if !method.is_routable() {
        return Err(Error::InvalidMethod);
    }

    let (path, query) = parse_request_target(parts[1])?;

    let version_token = parts[2].strip_prefix("HTTP/").ok_or(Error::BadRequest)?;
    let version = Version::from_token(version_token).ok_or(Error::VersionNotSupported)?;

    let mut headers = Headers::new();
    parse_header_block(reader, &mut headers, true).await?;

    if !headers.contains("Host") {
        return Err(Error::BadRequest);
    }

    Ok(RequestHead {
        method,
        path,
        query,
        version,
        headers,
    })
}

/// Parses a response head from the connection.
pub async fn parse_response_head<R>(reader: &mut R) -> Result<ResponseHead, Error>
where
    R: AsyncBufRead + Unpin,
{
    let status_line = match read_head_line(reader).await? {
        Some(line) => line,
        None => return Err(Error::ConnectionClosed),
    };

    let parts: Vec<&str> = status_line.split(' ').collect();
    if parts.len() < 3 {
        return Err(Error::InvalidMessage("incomplete status line"));
    }

    let version_token = parts[0]
        .strip_prefix("HTTP/")
        .ok_or(Error::InvalidMessage("invalid http version"))?;
    let version = Version::from_token(version_token)
        .ok_or(Error::InvalidMessage("invalid http version"))?;

    let status: u16 = parts[1]
        .parse()
        .map_err(|_| Error::InvalidMessage("invalid status code"))?;
    if !(100..600).contains(&status) {
        return Err(Error::InvalidMessage("invalid status code"));
    }

    let mut headers = Headers::new();
    parse_header_block(reader, &mut headers, false).await?;

    Ok(ResponseHead {
        version,
        status,
        headers,
    })
}

/// Reads header lines until the empty line that ends the block.
///
/// With `split_values`, a single line may populate several values under one
/// name (the server reading rule); without it the value is stored verbatim.
async fn parse_header_block<R>(
    reader: &mut R,
    headers: &mut Headers,
    split_values: bool,
) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let line = match read_head_line(reader).await? {
            Some(line) => line,
            None => return Err(Error::BadRequest),
        };
        if line.is_empty() {
            return Ok(());
        }

        let (name, value) = line.split_once(':').ok_or(Error::BadRequest)?;
        if split_values {
            for part in value.split(',') {
                headers.add(name, part.trim());
            }
        } else {
            headers.add(name, value.trim());
        }
    }
}

/// Splits an origin-form or absolute-form request target into path and query.
fn parse_request_target(target: &str) -> Result<(String, Option<String>), Error> {
    if target.starts_with('/') {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        return Ok((path, query));
    }

    // Absolute-form target; the URL crate owns the parsing.
    let url = Url::parse(target).map_err(|_| Error::BadRequest)?;
    Ok((url.path().to_string(), url.query().map(str::to_string)))
}
