use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use crate::http::cookie::Cookie;
use crate::http::error::Error;
use crate::http::headers::Headers;
use crate::http::{Method, Version, CHUNK_CHANNEL_CAPACITY, SOFTWARE_NAME};

use super::response::ClientResponse;

/// Callback run on each decoded response chunk. Returning `false` stops the
/// body read; the accumulated body is discarded either way.
pub type ClientChunkFn = Box<dyn FnMut(&[u8], &mut ClientResponse) -> bool + Send>;

/// The request target as given: a full URI, or an origin-form path whose
/// host comes from the `Host` header at send time.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    Absolute(Url),
    Origin(String),
}

/// An outgoing request.
///
/// Carries either a finite body or a chunk producer, never both on the
/// wire: once [`set_chunked`](Self::set_chunked) is called the body is not
/// sent and chunks come from the channel behind
/// [`chunk_sender`](Self::chunk_sender).
pub struct ClientRequest {
    pub(crate) method: Method,
    pub(crate) target: Target,
    pub(crate) version: Version,
    pub(crate) headers: Headers,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) chunked: bool,
    pub(crate) chunk_tx: Option<mpsc::Sender<Vec<u8>>>,
    pub(crate) chunk_rx: Option<mpsc::Receiver<Vec<u8>>>,
    pub(crate) on_chunk: Option<ClientChunkFn>,
    pub(crate) timeout: Option<Duration>,
}

impl ClientRequest {
    /// A request without a body. The method is chosen by the client verb
    /// used to send it.
    pub fn new(uri: &str) -> Result<Self, Error> {
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let mut headers = Headers::new();
        headers.set("User-Agent", SOFTWARE_NAME);

        Ok(Self {
            method: Method::Get,
            target: parse_target(uri)?,
            version: Version::Http11,
            headers,
            cookies: Vec::new(),
            body: None,
            chunked: false,
            chunk_tx: Some(chunk_tx),
            chunk_rx: Some(chunk_rx),
            on_chunk: None,
            timeout: None,
        })
    }

    /// A request carrying a finite body; sets `Content-Length` and a plain
    /// text `Content-Type` when the body is not empty.
    pub fn with_body(uri: &str, body: Vec<u8>) -> Result<Self, Error> {
        let mut request = Self::new(uri)?;
        if !body.is_empty() {
            request.headers.set("Content-Length", body.len().to_string());
            request.headers.set("Content-Type", "text/plain");
        }
        request.body = Some(body);
        Ok(request)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    pub fn get_header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name)
    }

    pub fn has_header_value(&self, name: &str, value: &str) -> bool {
        self.headers.has_value(name, value)
    }

    /// Asks the server to close the connection after this exchange.
    pub fn close_connection(&mut self) {
        self.headers.set("Connection", "close");
    }

    /// Read deadline for the response; unset means wait indefinitely.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    /// Switches the send path to chunked transfer; any finite body is
    /// ignored on the wire.
    pub fn set_chunked(&mut self) {
        self.chunked = true;
    }

    /// Producer handle for a chunked upload. Chunks are written in FIFO
    /// order; dropping every sender ends the stream and the engine writes
    /// the terminator.
    pub fn chunk_sender(&self) -> ChunkSender {
        ChunkSender(
            self.chunk_tx
                .as_ref()
                .cloned()
                .unwrap_or_else(|| mpsc::channel(CHUNK_CHANNEL_CAPACITY).0),
        )
    }

    /// Callback invoked on each chunk of a chunked response.
    pub fn on_chunk<F>(&mut self, callback: F)
    where
        F: FnMut(&[u8], &mut ClientResponse) -> bool + Send + 'static,
    {
        self.on_chunk = Some(Box::new(callback));
    }

    /// Replaces the request URI.
    pub fn set_uri(&mut self, uri: &str) -> Result<(), Error> {
        self.target = parse_target(uri)?;
        Ok(())
    }

    /// Serializes the head and, for non-chunked sends, the body.
    ///
    /// Rejects a body on GET or HEAD, and an empty non-absent body, before
    /// anything reaches the wire.
    pub(crate) fn to_bytes(&mut self, request_target: &str) -> Result<Vec<u8>, Error> {
        let request_line = format!("{} {} HTTP/{}\r\n", self.method, request_target, self.version);
        let mut buf = request_line.into_bytes();

        if self.chunked {
            self.headers.set("Transfer-Encoding", "chunked");
            self.headers.remove("Content-Length");
        } else if let Some(body) = &self.body {
            if !body.is_empty() {
                self.headers.set("Content-Length", body.len().to_string());
            }
        }

        self.headers.write_to(&mut buf);

        if !self.cookies.is_empty() {
            let pairs: Vec<String> = self
                .cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect();
            buf.extend_from_slice(format!("Cookie: {}\r\n", pairs.join("; ")).as_bytes());
        }

        buf.extend_from_slice(b"\r\n");

        if !self.chunked {
            if let Some(body) = &self.body {
                if body.is_empty() {
                    return Err(Error::InvalidLength);
                }
                if matches!(self.method, Method::Get | Method::Head) {
                    return Err(Error::InvalidMessage("method should not have a body"));
                }
                buf.extend_from_slice(body);
            }
        }

        Ok(buf)
    }
}

/// Sending half of the chunk channel handed to producer tasks.
pub struct ChunkSender(mpsc::Sender<Vec<u8>>);

impl ChunkSender {
    /// Queues one chunk; waits while the bounded channel is full.
    pub async fn send(&self, chunk: Vec<u8>) -> Result<(), Error> {
        self.0.send(chunk).await.map_err(|_| Error::ConnectionClosed)
    }
}

fn parse_target(uri: &str) -> Result<Target, Error> {
    if uri.starts_with('/') {
        return Ok(Target::Origin(uri.to_string()));
    }
    let url = Url::parse(uri).map_err(|_| Error::InvalidUri)?;
    if url.host_str().is_none() {
        return Err(Error::InvalidUri);
    }
    Ok(Target::Absolute(url))
}
