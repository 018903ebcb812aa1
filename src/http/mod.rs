//! HTTP/1.x protocol core.
//!
//! This module implements the wire-level pieces shared by the server and the
//! client: message framing, header handling, body transport and cookies.
//!
//! # Architecture
//!
//! The protocol layer is organized into several submodules:
//!
//! - **`parser`**: Reads request lines, status lines and header blocks
//! - **`body`**: Reads and writes bodies by content length or chunked framing
//! - **`headers`**: Case-insensitive multi-valued header map
//! - **`cookie`**: `Set-Cookie` parsing, serialization and the client jar
//! - **`status`**: Status code constants and reason phrases
//! - **`error`**: The engine error taxonomy and its wire mapping
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Message flow
//!
//! ```text
//!   server: read head -> route -> read body -> run handler -> write response
//!   client: write head -> stream chunks -> read head -> read body -> cookies
//! ```
//!
//! Both directions share the same framing rules: a message carries either a
//! `Content-Length` body or a `Transfer-Encoding: chunked` stream, never
//! both, and bytes past the framed body belong to the next message on the
//! connection.

pub mod body;
pub mod cookie;
pub mod error;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod status;

use std::fmt;
use std::time::Duration;

use crate::http::headers::Headers;

/// Value of the `Server` and `User-Agent` headers.
pub const SOFTWARE_NAME: &str = "Easyhttp 1.0";

/// Idle deadline applied to every read round, and to pooled connections.
pub const KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Redirect hops a client follows before giving up.
pub const DEFAULT_MAX_REDIRECTS: u8 = 10;

/// Capacity of the upload chunk channel between producer and sender.
pub const CHUNK_CHANNEL_CAPACITY: usize = 1;

/// HTTP request methods.
///
/// `CONNECT`, `OPTIONS` and `TRACE` are recognized names but the server
/// never routes them; see [`Method::is_routable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
}

impl Method {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "CONNECT" => Some(Method::Connect),
            "OPTIONS" => Some(Method::Options),
            "TRACE" => Some(Method::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }

    /// Whether the server dispatcher accepts this method.
    pub fn is_routable(&self) -> bool {
        matches!(
            self,
            Method::Get
                | Method::Head
                | Method::Post
                | Method::Put
                | Method::Patch
                | Method::Delete
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two protocol versions the engine speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Parses the numeric part of a version token (`"1.1"`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1.0" => Some(Version::Http10),
            "1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "1.0",
            Version::Http11 => "1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the connection must close after the current exchange.
///
/// HTTP/1.1 connections persist unless `Connection: close` was sent;
/// HTTP/1.0 connections close unless `Connection: keep-alive` was sent.
pub fn is_closing(version: Version, headers: &Headers) -> bool {
    match version {
        Version::Http10 => !headers.has_value("Connection", "keep-alive"),
        Version::Http11 => headers.has_value("Connection", "close"),
    }
}
