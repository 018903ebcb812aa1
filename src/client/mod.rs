//! HTTP client: connection pool, cookie jar and the send path.

pub mod request;
pub mod response;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use url::Url;

use crate::http::body::{encode_chunk, read_chunked_body, read_full_body, CHUNK_TERMINATOR};
use crate::http::cookie::{Cookie, CookieJar};
use crate::http::error::Error;
use crate::http::parser::parse_response_head;
use crate::http::{is_closing, Method, Version, DEFAULT_MAX_REDIRECTS};
use crate::net::ClientStream;

pub use request::{ChunkSender, ClientChunkFn, ClientRequest};
pub use response::ClientResponse;

use request::Target;

/// An HTTP/1.x client.
///
/// Owns its connection pool (at most one connection per host:port, reused
/// across sequential sends) and its cookie jar. A client is a sequential
/// resource: each logical user should own one.
pub struct Client {
    connections: HashMap<String, ClientStream>,
    jar: CookieJar,
    /// TLS configuration for `https` URIs; a default with the bundled roots
    /// is built when unset.
    pub tls_config: Option<Arc<ClientConfig>>,
    /// Redirect hops before a send fails with `too many redirects`.
    pub max_redirects: u8,
}

impl Client {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            jar: CookieJar::new(),
            tls_config: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub async fn get(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Get, request).await
    }

    pub async fn head(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Head, request).await
    }

    pub async fn post(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Post, request).await
    }

    pub async fn put(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Put, request).await
    }

    pub async fn patch(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Patch, request).await
    }

    pub async fn delete(&mut self, request: ClientRequest) -> Result<ClientResponse, Error> {
        self.send(Method::Delete, request).await
    }

    /// Seeds the cookie jar for a URI, as if a response had set them.
    pub fn set_cookies(&mut self, uri: &Url, cookies: Vec<Cookie>) {
        self.jar.set_cookies(uri, cookies);
    }

    /// The cookies the jar would attach to a request for `uri`.
    pub fn cookies(&mut self, uri: &Url) -> Vec<Cookie> {
        self.jar.cookies(uri)
    }

    /// Number of currently pooled connections.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }

    /// Sends one logical request, following redirects up to the cap.
    async fn send(
        &mut self,
        method: Method,
        mut request: ClientRequest,
    ) -> Result<ClientResponse, Error> {
        request.method = method;

        let mut response: Option<ClientResponse> = None;
        let mut redirects: u8 = 0;
        let mut redirecting = true;

        while redirects < self.max_redirects && redirecting {
            let url = resolve_target(&mut request)?;
            request.headers.set("Host", host_header_value(&url));

            let key = pool_key(&url)?;
            let mut connection = match self.connections.remove(&key) {
                Some(pooled) => {
                    if pooled.is_open().await {
                        tracing::debug!(host = %key, "Reusing pooled connection");
                        pooled
                    } else {
                        self.dial(&url).await?
                    }
                }
                None => self.dial(&url).await?,
            };

            request.cookies = self.jar.cookies(&url);

            let head = request.to_bytes(&request_target(&url))?;
            connection.write_all(&head).await?;
            if request.chunked {
                send_chunks(&mut connection, &mut request).await?;
            }
            connection.flush().await?;

            let current = read_response(&mut connection, &mut request).await?;

            self.jar.set_cookies(&url, current.cookies().to_vec());

            if is_closing(request.version, &request.headers) {
                drop(connection);
            } else {
                self.connections.insert(key, connection);
            }

            redirecting = (300..400).contains(&current.status());
            if redirecting {
                match current.get_header("Location").and_then(|v| v.first()) {
                    Some(location) => apply_location(&mut request, location)?,
                    None => redirecting = false,
                }
            }

            response = Some(current);
            redirects += 1;
        }

        if redirects == self.max_redirects {
            return Err(Error::TooManyRedirects);
        }
        response.ok_or(Error::TooManyRedirects)
    }

    async fn dial(&self, url: &Url) -> Result<ClientStream, Error> {
        let host = url.host_str().ok_or(Error::InvalidUri)?;
        let port = url.port_or_known_default().unwrap_or(80);
        let address = format!("{}:{}", host, port);

        tracing::debug!(address = %address, "Dialing");
        let tcp = TcpStream::connect(&address).await?;

        if url.scheme() == "https" {
            let config = self
                .tls_config
                .clone()
                .unwrap_or_else(default_tls_config);
            let connector = TlsConnector::from(config);
            let server_name =
                ServerName::try_from(host.to_string()).map_err(|_| Error::InvalidUri)?;
            let tls = connector
                .connect(server_name, tcp)
                .await
                .map_err(Error::Io)?;
            Ok(ClientStream::Tls(Box::new(tls)))
        } else {
            Ok(ClientStream::Plain(tcp))
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tls_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    CONFIG
        .get_or_init(|| {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            Arc::new(
                ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth(),
            )
        })
        .clone()
}

/// Drains the chunk producer onto the wire, then writes the terminator.
///
/// The request's own sender is dropped first so the stream ends when the
/// caller's producer drops its handle. On a redirected re-send the channel
/// is already gone and only the terminator is written.
async fn send_chunks(connection: &mut ClientStream, request: &mut ClientRequest) -> Result<(), Error> {
    drop(request.chunk_tx.take());
    if let Some(mut receiver) = request.chunk_rx.take() {
        while let Some(chunk) = receiver.recv().await {
            let mut frame = Vec::with_capacity(chunk.len() + 16);
            encode_chunk(&mut frame, &chunk);
            connection.write_all(&frame).await?;
        }
    }
    connection.write_all(CHUNK_TERMINATOR).await?;
    Ok(())
}

/// Reads the response head and body. The head honors the request's read
/// timeout when set; body rounds run under the keep-alive deadline. Either
/// deadline elapsing surfaces as a client timeout, and the connection is
/// not returned to the pool.
async fn read_response(
    connection: &mut ClientStream,
    request: &mut ClientRequest,
) -> Result<ClientResponse, Error> {
    let mut reader = BufReader::new(connection);

    let head = match request.timeout {
        Some(limit) => timeout(limit, parse_response_head(&mut reader))
            .await
            .map_err(|_| Error::ClientTimeout)??,
        None => parse_response_head(&mut reader).await?,
    };
    let mut response = ClientResponse::from_head(head)?;

    let is_chunked = response.version() == Version::Http11
        && response.has_header_value("Transfer-Encoding", "chunked");
    let content_length = response.headers().last("Content-Length").map(str::to_string);

    let outcome = if is_chunked {
        let response_ref = &mut response;
        let callback = request
            .on_chunk
            .as_mut()
            .map(|f| move |chunk: &[u8]| f(chunk, &mut *response_ref));
        match read_chunked_body(&mut reader, callback).await {
            Ok(body) => {
                response.set_body(Some(body));
                Ok(())
            }
            Err(e) => Err(e),
        }
    } else if let Some(value) = content_length {
        let length = value
            .parse::<u32>()
            .map_err(|_| Error::InvalidMessage("invalid content length"))?
            as usize;
        if length != 0 {
            match read_full_body(&mut reader, length).await {
                Ok(body) => {
                    response.set_body(Some(body));
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            Ok(())
        }
    } else {
        Ok(())
    };

    match outcome {
        Ok(()) => Ok(response),
        Err(Error::IdleTimeout) => Err(Error::ClientTimeout),
        Err(e) => Err(e),
    }
}

/// The host the request goes to: the URI's authority when present, else the
/// `Host` header, which upgrades an origin-form target to an absolute one.
fn resolve_target(request: &mut ClientRequest) -> Result<Url, Error> {
    match &request.target {
        Target::Absolute(url) => Ok(url.clone()),
        Target::Origin(origin) => {
            let host = request
                .headers
                .first("Host")
                .ok_or(Error::InvalidUri)?
                .to_string();
            let url =
                Url::parse(&format!("http://{}{}", host, origin)).map_err(|_| Error::InvalidUri)?;
            request.target = Target::Absolute(url.clone());
            Ok(url)
        }
    }
}

/// `Host` header value: the host, plus the port only when the URI named one.
fn host_header_value(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Pool key: host and effective port.
fn pool_key(url: &Url) -> Result<String, Error> {
    let host = url.host_str().ok_or(Error::InvalidUri)?;
    let port = url.port_or_known_default().unwrap_or(80);
    Ok(format!("{}:{}", host, port))
}

/// Origin-form target for the request line.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// A `Location` with an authority replaces the whole URI; a bare path
/// replaces only the path.
fn apply_location(request: &mut ClientRequest, location: &str) -> Result<(), Error> {
    match Url::parse(location) {
        Ok(url) if url.host_str().is_some() => {
            request.target = Target::Absolute(url);
            Ok(())
        }
        _ => {
            if let Target::Absolute(url) = &mut request.target {
                url.set_path(location);
            }
            Ok(())
        }
    }
}
