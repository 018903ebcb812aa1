use std::sync::Arc;
use std::time::SystemTime;

use bytes::BytesMut;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::Mutex;

use crate::http::body::encode_chunk;
use crate::http::cookie::Cookie;
use crate::http::error::Error;
use crate::http::headers::Headers;
use crate::http::{mime, status, Method, Version, SOFTWARE_NAME};
use crate::net::ServerStream;

/// Write side of the connection, shared with handlers for chunk streaming.
pub(crate) type ConnWriter = Arc<Mutex<WriteHalf<ServerStream>>>;

/// The response a handler builds.
///
/// Output is either buffered (the default; written whole after the handler
/// returns) or chunk-streamed: the first [`send_chunk`](Self::send_chunk)
/// writes the head with `Transfer-Encoding: chunked` and every call flushes
/// the body buffer as one chunk.
pub struct ServerResponse {
    version: Version,
    method: Method,
    status: u16,
    headers: Headers,
    cookies: Vec<Cookie>,
    // Reused across send_chunk calls; cleared, never reallocated.
    body: BytesMut,
    chunked: bool,
    writer: ConnWriter,
}

impl ServerResponse {
    pub(crate) fn new(version: Version, method: Method, writer: ConnWriter) -> Self {
        Self {
            version,
            method,
            status: status::OK,
            headers: Headers::new(),
            cookies: Vec::new(),
            body: BytesMut::new(),
            chunked: false,
            writer,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
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

    pub fn contains_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Queues a cookie, serialized as its own `Set-Cookie` header line.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    /// Appends bytes to the body buffer.
    pub fn write(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Streams the buffered body as one chunk and resets the buffer.
    ///
    /// The first call writes the response head; after that the status and
    /// headers are on the wire and can no longer change. Returns the chunk
    /// size written.
    pub async fn send_chunk(&mut self) -> Result<usize, Error> {
        if self.method == Method::Head {
            return Err(Error::InvalidMessage("head message cannot be chunked"));
        }
        if !self.chunked {
            self.chunked = true;
            let head = self.head_to_bytes();
            self.writer.lock().await.write_all(&head).await?;
        }

        let size = self.body.len();
        if size == 0 {
            return Err(Error::InvalidMessage("chunk size cannot be 0"));
        }
        let mut frame = Vec::with_capacity(size + 16);
        encode_chunk(&mut frame, &self.body);
        {
            let mut guard = self.writer.lock().await;
            guard.write_all(&frame).await?;
            guard.flush().await?;
        }

        self.body.clear();
        Ok(size)
    }

    /// Reads a file into the body, setting `Content-Type` from the built-in
    /// MIME table. A file that cannot be read turns the response into a 404.
    pub async fn send_file(&mut self, file_name: &str) {
        match tokio::fs::read(file_name).await {
            Ok(contents) => {
                if let Some(mime) = mime::content_type(file_name) {
                    self.headers.set("Content-Type", mime);
                }
                self.body.extend_from_slice(&contents);
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "Failed to read file");
                self.status = status::NOT_FOUND;
            }
        }
    }

    pub(crate) fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub(crate) fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Status line and header block, with the automatic headers applied and
    /// the framing header chosen.
    fn head_to_bytes(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        let status_line = format!(
            "HTTP/{} {} {}\r\n",
            self.version,
            self.status,
            status::reason_phrase(self.status)
        );
        buf.extend_from_slice(status_line.as_bytes());

        self.headers
            .set("Date", httpdate::fmt_http_date(SystemTime::now()));
        self.headers.set("Server", SOFTWARE_NAME);
        if self.status == status::UNAUTHORIZED && !self.headers.contains("WWW-Authenticate") {
            tracing::warn!("Status 401 response carries no WWW-Authenticate header");
        }

        if self.chunked {
            self.headers.set("Transfer-Encoding", "chunked");
            self.headers.remove("Content-Length");
        } else if !self.body.is_empty() {
            self.headers.set("Content-Length", self.body.len().to_string());
        }

        self.headers.write_to(&mut buf);

        for cookie in &self.cookies {
            buf.extend_from_slice(format!("Set-Cookie: {}\r\n", cookie).as_bytes());
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// The whole buffered response, ready for the wire.
    pub(crate) fn to_bytes(&mut self) -> Vec<u8> {
        let mut buf = self.head_to_bytes();
        if !self.chunked {
            buf.extend_from_slice(&self.body);
        }
        buf
    }
}

/// Head-and-automatic-headers-only response for engine-generated errors.
pub(crate) fn encode_error_response(status_code: u16) -> Vec<u8> {
    let mut buf = Vec::new();
    let status_line = format!(
        "HTTP/1.0 {} {}\r\n",
        status_code,
        status::reason_phrase(status_code)
    );
    buf.extend_from_slice(status_line.as_bytes());

    let mut headers = Headers::new();
    headers.set("Date", httpdate::fmt_http_date(SystemTime::now()));
    headers.set("Server", SOFTWARE_NAME);
    headers.write_to(&mut buf);

    buf.extend_from_slice(b"\r\n");
    buf
}
